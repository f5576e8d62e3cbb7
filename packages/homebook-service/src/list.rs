use uuid::Uuid;

use crate::{AddressBook, Result};
use homebook_domain::{AddressRecord, CountryGroup};

impl AddressBook {
	/// All records, in country-group order.
	pub async fn list(&self) -> Result<Vec<AddressRecord>> {
		Ok(self.list_by_country().await?.into_iter().flat_map(|group| group.addresses).collect())
	}

	pub async fn list_by_country(&self) -> Result<Vec<CountryGroup>> {
		let records = self.store.fetch_all().await?;

		Ok(homebook_domain::group_by_country(records))
	}

	pub async fn get(&self, address_id: Uuid) -> Result<AddressRecord> {
		self.fetch_existing(address_id).await
	}
}

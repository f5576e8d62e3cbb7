use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AddressBook, AddressEvent, Result, current};
use homebook_domain::{AddressFields, AddressRecord, ChangeSet, Location};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddAddressRequest {
	pub fields: AddressFields,
	/// The search result the user picked, if any. Its placemark fills blank fields.
	pub location: Option<Location>,
}

impl AddressBook {
	/// Validates and stores a new record. When it is flagged current, the insert and every
	/// demotion are committed together.
	pub async fn create(&self, req: AddAddressRequest) -> Result<AddressRecord> {
		let now = OffsetDateTime::now_utc();
		let record = self.assembler.build(&req.fields, req.location.as_ref(), now)?;
		let _guard = self.write_lock.lock().await;
		let mut changes = ChangeSet::new();
		let demoted = if record.is_current {
			let records = self.store.fetch_all().await?;

			current::stage_demotions(&mut changes, &records, record.id, now)
		} else {
			Vec::new()
		};

		changes.insert(record.clone());
		self.store.save(&changes).await?;

		tracing::info!(
			address_id = %record.id,
			is_current = record.is_current,
			demoted = demoted.len(),
			"Address added."
		);

		self.emit(AddressEvent::Added(record.clone()));

		if record.is_current {
			for demoted in demoted {
				self.emit(AddressEvent::CurrentChanged(demoted));
			}

			self.emit(AddressEvent::CurrentChanged(record.clone()));
		}

		Ok(record)
	}
}

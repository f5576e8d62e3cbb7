use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{AddressBook, AddressEvent, Result, current};
use homebook_domain::{AddressFields, AddressRecord, ChangeSet, Location};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateAddressRequest {
	pub address_id: Uuid,
	pub fields: AddressFields,
	pub location: Option<Location>,
}

impl AddressBook {
	/// Re-validates and replaces the fields of an existing record. Other records are touched only
	/// when this edit sets the current flag.
	pub async fn update(&self, req: UpdateAddressRequest) -> Result<AddressRecord> {
		let _guard = self.write_lock.lock().await;
		let existing = self.fetch_existing(req.address_id).await?;
		let now = OffsetDateTime::now_utc();
		let record = self.assembler.rebuild(&existing, &req.fields, req.location.as_ref(), now)?;
		let mut changes = ChangeSet::new();
		let demoted = if record.is_current {
			let records = self.store.fetch_all().await?;

			current::stage_demotions(&mut changes, &records, record.id, now)
		} else {
			Vec::new()
		};

		changes.update(record.clone());
		self.store.save(&changes).await?;

		tracing::info!(address_id = %record.id, demoted = demoted.len(), "Address updated.");

		self.emit(AddressEvent::Updated(record.clone()));

		for demoted in demoted {
			self.emit(AddressEvent::CurrentChanged(demoted));
		}

		if existing.is_current != record.is_current {
			self.emit(AddressEvent::CurrentChanged(record.clone()));
		}

		Ok(record)
	}
}

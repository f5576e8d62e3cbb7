use time::OffsetDateTime;
use uuid::Uuid;

use crate::{AddressBook, AddressEvent, Error, Result};
use homebook_domain::{AddressRecord, ChangeSet};

impl AddressBook {
	/// Makes `address_id` the single current address. Every other current record is demoted in
	/// the same commit; a failed commit changes nothing.
	pub async fn set_current(&self, address_id: Uuid) -> Result<AddressRecord> {
		let _guard = self.write_lock.lock().await;
		let records = self.store.fetch_all().await?;
		let Some(target) = records.iter().find(|record| record.id == address_id).cloned() else {
			return Err(Error::NotFound { message: format!("Address {address_id} does not exist.") });
		};
		let others_current = records.iter().any(|record| record.is_current && record.id != address_id);

		if target.is_current && !others_current {
			return Ok(target);
		}

		let now = OffsetDateTime::now_utc();
		let mut changes = ChangeSet::new();
		let demoted = stage_demotions(&mut changes, &records, address_id, now);
		let mut promoted = target;
		let promote = !promoted.is_current;

		if promote {
			promoted.is_current = true;
			promoted.updated_at = now;

			changes.set_current(address_id, true, now);
		}

		self.store.save(&changes).await?;

		tracing::info!(
			address_id = %address_id,
			demoted = demoted.len(),
			"Current address changed."
		);

		for record in demoted {
			self.emit(AddressEvent::CurrentChanged(record));
		}

		if promote {
			self.emit(AddressEvent::CurrentChanged(promoted.clone()));
		}

		Ok(promoted)
	}

	/// Clears the current flag on `address_id` only. No other record is promoted.
	pub async fn clear_current(&self, address_id: Uuid) -> Result<AddressRecord> {
		let _guard = self.write_lock.lock().await;
		let mut record = self.fetch_existing(address_id).await?;

		if !record.is_current {
			return Ok(record);
		}

		record.is_current = false;
		record.updated_at = OffsetDateTime::now_utc();

		let mut changes = ChangeSet::new();

		changes.set_current(address_id, false, record.updated_at);
		self.store.save(&changes).await?;

		tracing::info!(address_id = %address_id, "Current address cleared.");

		self.emit(AddressEvent::CurrentChanged(record.clone()));

		Ok(record)
	}

	/// The current address, if any. More than one current record is reported as a conflict.
	pub async fn current(&self) -> Result<Option<AddressRecord>> {
		let mut current = self
			.store
			.fetch_all()
			.await?
			.into_iter()
			.filter(|record| record.is_current)
			.collect::<Vec<_>>();

		match current.len() {
			0 => Ok(None),
			1 => Ok(current.pop()),
			count => {
				tracing::error!(count, "Store holds more than one current address.");

				Err(Error::Conflict {
					message: format!("{count} addresses are flagged current; expected at most one."),
				})
			},
		}
	}
}

/// Stages a flag-only demotion of every current record except `keep`. The store clears whatever
/// is current at commit time; the returned copies are what `records` looked like once demoted.
pub(crate) fn stage_demotions(
	changes: &mut ChangeSet,
	records: &[AddressRecord],
	keep: Uuid,
	now: OffsetDateTime,
) -> Vec<AddressRecord> {
	let demoted = records
		.iter()
		.filter(|record| record.is_current && record.id != keep)
		.map(|record| AddressRecord { is_current: false, updated_at: now, ..record.clone() })
		.collect::<Vec<_>>();

	if !demoted.is_empty() {
		changes.demote_others(keep, now);
	}

	demoted
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AddressBook, AddressEvent, Result};
use homebook_domain::{ChangeSet, ChildCounts};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub address_id: Uuid,
	/// Children removed together with the record.
	pub removed: ChildCounts,
	pub was_current: bool,
}

impl AddressBook {
	/// Removes a record and all of its children. Deleting the current record leaves no current
	/// record.
	pub async fn delete(&self, address_id: Uuid) -> Result<DeleteResponse> {
		let _guard = self.write_lock.lock().await;
		let existing = self.fetch_existing(address_id).await?;
		let removed = self.store.child_counts(address_id).await?;
		let mut changes = ChangeSet::new();

		changes.delete(address_id);
		self.store.save(&changes).await?;

		tracing::info!(
			address_id = %address_id,
			children = removed.total(),
			was_current = existing.is_current,
			"Address deleted."
		);

		let was_current = existing.is_current;

		self.emit(AddressEvent::Deleted(existing));

		Ok(DeleteResponse { address_id, removed, was_current })
	}
}

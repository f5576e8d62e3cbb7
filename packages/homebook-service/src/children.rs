use time::OffsetDateTime;
use uuid::Uuid;

use crate::{AddressBook, AddressEvent, Error, Result};
use homebook_domain::{AddressChild, AddressRecord, ChangeSet};

impl AddressBook {
	/// Attaches a document, photo, checklist item or note. Returns the new child's id.
	pub async fn add_child(&self, address_id: Uuid, child: AddressChild) -> Result<Uuid> {
		validate_child(&child)?;

		let _guard = self.write_lock.lock().await;
		let mut record = self.fetch_existing(address_id).await?;
		let child_id = record.attach(child, OffsetDateTime::now_utc());
		let mut changes = ChangeSet::new();

		changes.replace_children(record.clone());
		self.store.save(&changes).await?;

		tracing::debug!(address_id = %address_id, child_id = %child_id, "Child attached.");

		self.emit(AddressEvent::Updated(record));

		Ok(child_id)
	}

	pub async fn set_checklist_item_done(
		&self,
		address_id: Uuid,
		item_id: Uuid,
		done: bool,
	) -> Result<AddressRecord> {
		let _guard = self.write_lock.lock().await;
		let mut record = self.fetch_existing(address_id).await?;
		let Some(item) = record.checklist.iter_mut().find(|item| item.id == item_id) else {
			return Err(Error::NotFound {
				message: format!("Checklist item {item_id} does not exist on address {address_id}."),
			});
		};

		if item.done == done {
			return Ok(record);
		}

		item.done = done;
		record.updated_at = OffsetDateTime::now_utc();

		let mut changes = ChangeSet::new();

		changes.replace_children(record.clone());
		self.store.save(&changes).await?;
		self.emit(AddressEvent::Updated(record.clone()));

		Ok(record)
	}
}

fn validate_child(child: &AddressChild) -> Result<()> {
	let (field, value) = match child {
		AddressChild::Document { title, uri } => {
			if title.trim().is_empty() {
				("title", title)
			} else {
				("uri", uri)
			}
		},
		AddressChild::Photo { uri, .. } => ("uri", uri),
		AddressChild::ChecklistItem { title } => ("title", title),
		AddressChild::Note { body } => ("body", body),
	};

	if value.trim().is_empty() {
		return Err(Error::InvalidRequest { message: format!("{field} must be non-empty.") });
	}

	Ok(())
}

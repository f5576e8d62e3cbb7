use std::{mem, sync::Mutex};

use uuid::Uuid;

use crate::{AddressStore, BoxFuture, Error, Result};
use homebook_domain::{AddressRecord, Change, ChangeSet, ChildCounts};
use homebook_storage::{addresses, db::Db};

/// Postgres-backed store. Each change set is one transaction.
pub struct PgAddressStore {
	db: Db,
}
impl PgAddressStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}
impl AddressStore for PgAddressStore {
	fn fetch_all<'a>(&'a self) -> BoxFuture<'a, Result<Vec<AddressRecord>>> {
		Box::pin(async move { Ok(addresses::load_all(&self.db).await?) })
	}

	fn fetch<'a>(&'a self, address_id: Uuid) -> BoxFuture<'a, Result<Option<AddressRecord>>> {
		Box::pin(async move { Ok(addresses::load(&self.db, address_id).await?) })
	}

	fn child_counts<'a>(&'a self, address_id: Uuid) -> BoxFuture<'a, Result<ChildCounts>> {
		Box::pin(async move { Ok(addresses::child_counts(&self.db, address_id).await?) })
	}

	fn save<'a>(&'a self, changes: &'a ChangeSet) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			addresses::apply(&self.db, changes).await.map_err(|err| match err {
				homebook_storage::Error::NotFound(message) => Error::NotFound { message },
				other => Error::PersistenceCommit { message: other.to_string() },
			})
		})
	}
}

/// In-process store. Commits are applied to a copy and swapped in only when the copy still holds
/// at most one current record.
#[derive(Default)]
pub struct MemoryAddressStore {
	records: Mutex<Vec<AddressRecord>>,
}
impl MemoryAddressStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_records(records: Vec<AddressRecord>) -> Self {
		Self { records: Mutex::new(records) }
	}

	fn snapshot(&self) -> Vec<AddressRecord> {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn commit(&self, changes: &ChangeSet) -> Result<()> {
		let mut records = self.records.lock().unwrap_or_else(|err| err.into_inner());
		let mut next = records.clone();

		for change in changes.in_commit_order() {
			match change {
				Change::Insert(record) => {
					if next.iter().any(|existing| existing.id == record.id) {
						return Err(Error::PersistenceCommit {
							message: format!("Address {} already exists.", record.id),
						});
					}

					next.push(record.clone());
				},
				Change::Update(record) => {
					let slot = find_mut(&mut next, record.id)?;
					let mut updated = record.clone();

					updated.documents = mem::take(&mut slot.documents);
					updated.photos = mem::take(&mut slot.photos);
					updated.checklist = mem::take(&mut slot.checklist);
					updated.notes = mem::take(&mut slot.notes);
					*slot = updated;
				},
				Change::ReplaceChildren(record) => {
					let slot = find_mut(&mut next, record.id)?;

					slot.documents = record.documents.clone();
					slot.photos = record.photos.clone();
					slot.checklist = record.checklist.clone();
					slot.notes = record.notes.clone();
					slot.updated_at = record.updated_at;
				},
				Change::SetCurrent { address_id, is_current, at } => {
					let slot = find_mut(&mut next, *address_id)?;

					slot.is_current = *is_current;
					slot.updated_at = *at;
				},
				Change::DemoteOthers { keep, at } => {
					for slot in next.iter_mut().filter(|slot| slot.is_current && slot.id != *keep) {
						slot.is_current = false;
						slot.updated_at = *at;
					}
				},
				Change::Delete(address_id) => {
					let before = next.len();

					next.retain(|existing| existing.id != *address_id);

					if next.len() == before {
						return Err(Error::NotFound {
							message: format!("Address {address_id} does not exist."),
						});
					}
				},
			}
		}

		if next.iter().filter(|record| record.is_current).count() > 1 {
			return Err(Error::PersistenceCommit {
				message: "Commit would leave more than one current address.".to_string(),
			});
		}

		*records = next;

		Ok(())
	}
}
impl AddressStore for MemoryAddressStore {
	fn fetch_all<'a>(&'a self) -> BoxFuture<'a, Result<Vec<AddressRecord>>> {
		let records = self.snapshot();

		Box::pin(async move { Ok(records) })
	}

	fn fetch<'a>(&'a self, address_id: Uuid) -> BoxFuture<'a, Result<Option<AddressRecord>>> {
		let record = self.snapshot().into_iter().find(|record| record.id == address_id);

		Box::pin(async move { Ok(record) })
	}

	fn child_counts<'a>(&'a self, address_id: Uuid) -> BoxFuture<'a, Result<ChildCounts>> {
		let counts = self
			.snapshot()
			.iter()
			.find(|record| record.id == address_id)
			.map(AddressRecord::child_counts)
			.unwrap_or_default();

		Box::pin(async move { Ok(counts) })
	}

	fn save<'a>(&'a self, changes: &'a ChangeSet) -> BoxFuture<'a, Result<()>> {
		let result = self.commit(changes);

		Box::pin(async move { result })
	}
}

fn find_mut(records: &mut [AddressRecord], address_id: Uuid) -> Result<&mut AddressRecord> {
	records.iter_mut().find(|record| record.id == address_id).ok_or_else(|| Error::NotFound {
		message: format!("Address {address_id} does not exist."),
	})
}

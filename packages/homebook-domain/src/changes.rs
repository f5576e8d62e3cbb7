use time::OffsetDateTime;
use uuid::Uuid;

use crate::address::AddressRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
	Insert(AddressRecord),
	/// Rewrites the record's own fields, including the current flag. Stored children are kept.
	Update(AddressRecord),
	/// Replaces the record's children with the ones it carries. Other fields are kept.
	ReplaceChildren(AddressRecord),
	/// Flips the current flag on one record and nothing else.
	SetCurrent { address_id: Uuid, is_current: bool, at: OffsetDateTime },
	/// Clears the current flag on every stored record except `keep`.
	DemoteOthers { keep: Uuid, at: OffsetDateTime },
	Delete(Uuid),
}
impl Change {
	/// The record this change targets. For `DemoteOthers` this is the record left untouched.
	pub fn address_id(&self) -> Uuid {
		match self {
			Self::Insert(record) | Self::Update(record) | Self::ReplaceChildren(record) => record.id,
			Self::SetCurrent { address_id, .. } => *address_id,
			Self::DemoteOthers { keep, .. } => *keep,
			Self::Delete(id) => *id,
		}
	}

	fn commit_rank(&self) -> u8 {
		match self {
			Self::Delete(_) => 0,
			Self::DemoteOthers { .. } | Self::ReplaceChildren(_) => 1,
			Self::SetCurrent { is_current: false, .. } => 1,
			Self::Insert(record) | Self::Update(record) if !record.is_current => 1,
			Self::Insert(_) | Self::Update(_) | Self::SetCurrent { .. } => 2,
		}
	}
}

/// Mutations staged for one atomic commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
	changes: Vec<Change>,
}
impl ChangeSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, record: AddressRecord) -> &mut Self {
		self.changes.push(Change::Insert(record));

		self
	}

	pub fn update(&mut self, record: AddressRecord) -> &mut Self {
		self.changes.push(Change::Update(record));

		self
	}

	pub fn replace_children(&mut self, record: AddressRecord) -> &mut Self {
		self.changes.push(Change::ReplaceChildren(record));

		self
	}

	pub fn set_current(
		&mut self,
		address_id: Uuid,
		is_current: bool,
		at: OffsetDateTime,
	) -> &mut Self {
		self.changes.push(Change::SetCurrent { address_id, is_current, at });

		self
	}

	pub fn demote_others(&mut self, keep: Uuid, at: OffsetDateTime) -> &mut Self {
		self.changes.push(Change::DemoteOthers { keep, at });

		self
	}

	pub fn delete(&mut self, id: Uuid) -> &mut Self {
		self.changes.push(Change::Delete(id));

		self
	}

	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.changes.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Change> {
		self.changes.iter()
	}

	/// Changes in the order a store must apply them: deletions, then writes that leave a record
	/// non-current, then writes that make a record current. A store enforcing one current row at
	/// every statement never sees two flags set.
	pub fn in_commit_order(&self) -> Vec<&Change> {
		let mut ordered = self.changes.iter().collect::<Vec<_>>();

		ordered.sort_by_key(|change| change.commit_rank());

		ordered
	}
}

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::location::Coordinate;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
	pub name: String,
	/// ISO 3166-1 alpha-2, upper case. Empty when unknown.
	pub code: String,
}
impl Country {
	pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
		Self { name: name.into().trim().to_string(), code: code.into().trim().to_ascii_uppercase() }
	}

	pub fn is_empty(&self) -> bool {
		self.name.trim().is_empty()
	}

	/// Regional-indicator flag for the ISO code, if the code is a valid alpha-2 pair.
	pub fn flag(&self) -> Option<String> {
		let code = self.code.as_bytes();

		if code.len() != 2 || !code.iter().all(u8::is_ascii_uppercase) {
			return None;
		}

		code.iter().map(|byte| char::from_u32(0x1F1E6 + u32::from(byte - b'A'))).collect()
	}

	/// Case-insensitive name used to match countries entered without a code.
	pub fn name_key(&self) -> String {
		self.name.trim().to_lowercase()
	}

	/// Whether `other` names the same country, ignoring case and surrounding spaces.
	pub fn same_name(&self, other: &Country) -> bool {
		!self.is_empty() && self.name_key() == other.name_key()
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
	#[default]
	House,
	Flat,
	OtherPlace,
}
impl BuildingType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::House => "house",
			Self::Flat => "flat",
			Self::OtherPlace => "other_place",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"house" => Some(Self::House),
			"flat" => Some(Self::Flat),
			"other_place" => Some(Self::OtherPlace),
			_ => None,
		}
	}
}

/// Who owns the place. Anything other than `Myself` is a tenancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
	#[default]
	Myself,
	OtherPerson,
}
impl Owner {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Myself => "myself",
			Self::OtherPerson => "other_person",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"myself" => Some(Self::Myself),
			"other_person" => Some(Self::OtherPerson),
			_ => None,
		}
	}

	pub fn is_tenancy(self) -> bool {
		matches!(self, Self::OtherPerson)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
	pub id: Uuid,
	pub title: String,
	pub uri: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
	pub id: Uuid,
	pub uri: String,
	pub caption: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
	pub id: Uuid,
	pub title: String,
	pub done: bool,
	pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
	pub id: Uuid,
	pub body: String,
	pub created_at: OffsetDateTime,
}

/// A child entity to attach to an existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressChild {
	Document { title: String, uri: String },
	Photo { uri: String, caption: Option<String> },
	ChecklistItem { title: String },
	Note { body: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCounts {
	pub documents: usize,
	pub photos: usize,
	pub checklist_items: usize,
	pub notes: usize,
}
impl ChildCounts {
	pub fn total(&self) -> usize {
		self.documents + self.photos + self.checklist_items + self.notes
	}

	pub fn is_empty(&self) -> bool {
		self.total() == 0
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
	pub id: Uuid,
	pub apartment: Option<String>,
	pub line1: String,
	pub line2: Option<String>,
	pub sub_locality: Option<String>,
	pub city: String,
	pub postal_code: Option<String>,
	pub country: Country,
	pub coordinate: Option<Coordinate>,
	pub building_type: BuildingType,
	pub owner: Owner,
	pub start_date: Option<Date>,
	/// `None` means the stay is ongoing.
	pub end_date: Option<Date>,
	pub is_current: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub documents: Vec<Document>,
	pub photos: Vec<Photo>,
	pub checklist: Vec<ChecklistItem>,
	pub notes: Vec<Note>,
}
impl AddressRecord {
	pub fn child_counts(&self) -> ChildCounts {
		ChildCounts {
			documents: self.documents.len(),
			photos: self.photos.len(),
			checklist_items: self.checklist.len(),
			notes: self.notes.len(),
		}
	}

	/// Appends a child and returns its new id.
	pub fn attach(&mut self, child: AddressChild, now: OffsetDateTime) -> Uuid {
		let id = Uuid::new_v4();

		match child {
			AddressChild::Document { title, uri } =>
				self.documents.push(Document { id, title, uri, created_at: now }),
			AddressChild::Photo { uri, caption } =>
				self.photos.push(Photo { id, uri, caption, created_at: now }),
			AddressChild::ChecklistItem { title } => {
				let position = self.checklist.iter().map(|item| item.position + 1).max().unwrap_or(0);

				self.checklist.push(ChecklistItem { id, title, done: false, position });
			},
			AddressChild::Note { body } => self.notes.push(Note { id, body, created_at: now }),
		}

		self.updated_at = now;

		id
	}

	/// Single-line summary used in listings and logs.
	pub fn summary(&self) -> String {
		let mut parts = Vec::with_capacity(3);

		match self.apartment.as_deref().map(str::trim).filter(|apt| !apt.is_empty()) {
			Some(apartment) => parts.push(format!("{apartment}/{}", self.line1)),
			None => parts.push(self.line1.clone()),
		}

		parts.push(self.city.clone());

		if !self.country.is_empty() {
			parts.push(self.country.name.clone());
		}

		parts.join(", ")
	}
}

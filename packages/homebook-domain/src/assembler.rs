use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
	address::{AddressRecord, BuildingType, ChecklistItem, Country, Owner},
	location::{Location, Placemark, non_blank},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
	Line1,
	City,
	Country,
	StartDate,
}
impl fmt::Display for RequiredField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Line1 => "line1",
			Self::City => "city",
			Self::Country => "country",
			Self::StartDate => "start_date",
		};

		f.write_str(label)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("Missing required field: {field}.")]
	MissingRequiredField { field: RequiredField },
	#[error("Start date {start_date} is after end date {end_date}.")]
	InvalidDateRange { start_date: Date, end_date: Date },
}

/// User-entered fields. Blank strings count as "not entered" and may be filled from a
/// resolved placemark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressFields {
	pub apartment: Option<String>,
	pub line1: Option<String>,
	pub line2: Option<String>,
	pub sub_locality: Option<String>,
	pub city: Option<String>,
	pub postal_code: Option<String>,
	pub country: Option<Country>,
	#[serde(default)]
	pub building_type: BuildingType,
	#[serde(default)]
	pub owner: Owner,
	pub start_date: Option<Date>,
	pub end_date: Option<Date>,
	#[serde(default)]
	pub is_current: bool,
}

pub struct AddressRecordAssembler {
	checklist_template: Vec<String>,
}
impl AddressRecordAssembler {
	pub fn new(checklist_template: Vec<String>) -> Self {
		Self { checklist_template }
	}

	pub fn from_config(cfg: &homebook_config::Addresses) -> Self {
		Self::new(cfg.self_checklist.clone())
	}

	pub fn validate(&self, fields: &AddressFields) -> Result<(), ValidationError> {
		validate(fields)
	}

	/// Materialises a new record. Identity, timestamps, and default children are assigned here.
	pub fn build(
		&self,
		fields: &AddressFields,
		location: Option<&Location>,
		now: OffsetDateTime,
	) -> Result<AddressRecord, ValidationError> {
		let merged = merge(fields, location.map(|location| &location.placemark));

		validate(&merged)?;

		let checklist = match merged.owner {
			Owner::Myself => self.default_checklist(),
			Owner::OtherPerson => Vec::new(),
		};

		Ok(AddressRecord {
			id: Uuid::new_v4(),
			apartment: clean(merged.apartment),
			line1: clean(merged.line1).unwrap_or_default(),
			line2: clean(merged.line2),
			sub_locality: clean(merged.sub_locality),
			city: clean(merged.city).unwrap_or_default(),
			postal_code: clean(merged.postal_code),
			country: merged.country.unwrap_or_default(),
			coordinate: location.map(|location| location.coordinate),
			building_type: merged.building_type,
			owner: merged.owner,
			start_date: merged.start_date,
			end_date: merged.end_date,
			is_current: merged.is_current,
			created_at: now,
			updated_at: now,
			documents: Vec::new(),
			photos: Vec::new(),
			checklist,
			notes: Vec::new(),
		})
	}

	/// Applies edited fields to an existing record. Identity, creation time, and children are
	/// kept; the coordinate is replaced only when a new location was resolved.
	pub fn rebuild(
		&self,
		existing: &AddressRecord,
		fields: &AddressFields,
		location: Option<&Location>,
		now: OffsetDateTime,
	) -> Result<AddressRecord, ValidationError> {
		let mut record = self.build(fields, location, now)?;

		record.id = existing.id;
		record.created_at = existing.created_at;
		record.coordinate = location.map(|location| location.coordinate).or(existing.coordinate);
		record.documents = existing.documents.clone();
		record.photos = existing.photos.clone();
		record.checklist = existing.checklist.clone();
		record.notes = existing.notes.clone();

		Ok(record)
	}

	fn default_checklist(&self) -> Vec<ChecklistItem> {
		self.checklist_template
			.iter()
			.enumerate()
			.map(|(position, title)| ChecklistItem {
				id: Uuid::new_v4(),
				title: title.clone(),
				done: false,
				position: position as i32,
			})
			.collect()
	}
}

pub fn validate(fields: &AddressFields) -> Result<(), ValidationError> {
	if non_blank(fields.line1.as_deref()).is_none() {
		return Err(ValidationError::MissingRequiredField { field: RequiredField::Line1 });
	}
	if non_blank(fields.city.as_deref()).is_none() {
		return Err(ValidationError::MissingRequiredField { field: RequiredField::City });
	}
	if fields.country.as_ref().map(Country::is_empty).unwrap_or(true) {
		return Err(ValidationError::MissingRequiredField { field: RequiredField::Country });
	}
	if fields.owner.is_tenancy() && fields.start_date.is_none() {
		return Err(ValidationError::MissingRequiredField { field: RequiredField::StartDate });
	}

	if let (Some(start_date), Some(end_date)) = (fields.start_date, fields.end_date)
		&& start_date > end_date
	{
		return Err(ValidationError::InvalidDateRange { start_date, end_date });
	}

	Ok(())
}

/// Fills fields the user left blank from the placemark. User input always wins.
pub fn merge(fields: &AddressFields, placemark: Option<&Placemark>) -> AddressFields {
	let Some(placemark) = placemark else {
		return fields.clone();
	};
	let provider_country = non_blank(placemark.country.as_deref()).map(|name| {
		Country::new(name, placemark.iso_country_code.as_deref().unwrap_or_default())
	});
	let country = match (&fields.country, provider_country) {
		(Some(country), Some(provider))
			if country.code.is_empty() && country.same_name(&provider) =>
			Some(Country::new(country.name.as_str(), provider.code)),
		(Some(country), _) if !country.is_empty() => Some(country.clone()),
		(_, provider) => provider,
	};

	AddressFields {
		apartment: fields.apartment.clone(),
		line1: prefer_user(&fields.line1, placemark.street_line().as_deref()),
		line2: fields.line2.clone(),
		sub_locality: prefer_user(&fields.sub_locality, placemark.sub_locality.as_deref()),
		city: prefer_user(&fields.city, placemark.locality.as_deref()),
		postal_code: prefer_user(&fields.postal_code, placemark.postal_code.as_deref()),
		country,
		building_type: fields.building_type,
		owner: fields.owner,
		start_date: fields.start_date,
		end_date: fields.end_date,
		is_current: fields.is_current,
	}
}

fn prefer_user(user: &Option<String>, provider: Option<&str>) -> Option<String> {
	non_blank(user.as_deref()).or_else(|| non_blank(provider)).map(str::to_string)
}

fn clean(value: Option<String>) -> Option<String> {
	non_blank(value.as_deref()).map(str::to_string)
}

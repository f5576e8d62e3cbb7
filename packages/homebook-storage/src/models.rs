use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct AddressRow {
	pub address_id: Uuid,
	pub apartment: Option<String>,
	pub line1: String,
	pub line2: Option<String>,
	pub sub_locality: Option<String>,
	pub city: String,
	pub postal_code: Option<String>,
	pub country_name: String,
	pub country_code: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub building_type: String,
	pub owner: String,
	pub start_date: Option<Date>,
	pub end_date: Option<Date>,
	pub is_current: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct DocumentRow {
	pub document_id: Uuid,
	pub address_id: Uuid,
	pub title: String,
	pub uri: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PhotoRow {
	pub photo_id: Uuid,
	pub address_id: Uuid,
	pub uri: String,
	pub caption: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ChecklistItemRow {
	pub item_id: Uuid,
	pub address_id: Uuid,
	pub title: String,
	pub done: bool,
	pub position: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct NoteRow {
	pub note_id: Uuid,
	pub address_id: Uuid,
	pub body: String,
	pub created_at: OffsetDateTime,
}

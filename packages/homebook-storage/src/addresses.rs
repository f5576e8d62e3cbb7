use std::collections::HashMap;

use sqlx::{PgConnection, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{AddressRow, ChecklistItemRow, DocumentRow, NoteRow, PhotoRow},
};
use homebook_domain::{
	AddressRecord, BuildingType, Change, ChangeSet, ChecklistItem, ChildCounts, Coordinate,
	Country, Document, Note, Owner, Photo,
};

#[derive(Default)]
struct Children {
	documents: Vec<Document>,
	photos: Vec<Photo>,
	checklist: Vec<ChecklistItem>,
	notes: Vec<Note>,
}

pub async fn load_all(db: &Db) -> Result<Vec<AddressRecord>> {
	let mut conn = db.pool.acquire().await?;
	let rows: Vec<AddressRow> =
		sqlx::query_as("SELECT * FROM address_records ORDER BY created_at, address_id")
			.fetch_all(&mut *conn)
			.await?;
	let ids = rows.iter().map(|row| row.address_id).collect::<Vec<_>>();
	let mut children = load_children(&mut conn, &ids).await?;

	rows.into_iter()
		.map(|row| {
			let owned = children.remove(&row.address_id).unwrap_or_default();

			into_record(row, owned)
		})
		.collect()
}

pub async fn load(db: &Db, address_id: Uuid) -> Result<Option<AddressRecord>> {
	let mut conn = db.pool.acquire().await?;
	let row: Option<AddressRow> =
		sqlx::query_as("SELECT * FROM address_records WHERE address_id = $1")
			.bind(address_id)
			.fetch_optional(&mut *conn)
			.await?;
	let Some(row) = row else {
		return Ok(None);
	};
	let mut children = load_children(&mut conn, &[address_id]).await?;
	let owned = children.remove(&address_id).unwrap_or_default();

	into_record(row, owned).map(Some)
}

/// Counts child rows directly, so rows left behind by a broken cascade still show up.
pub async fn child_counts(db: &Db, address_id: Uuid) -> Result<ChildCounts> {
	let (documents, photos, checklist_items, notes): (i64, i64, i64, i64) = sqlx::query_as(
		"\
SELECT
	(SELECT count(*) FROM address_documents WHERE address_id = $1),
	(SELECT count(*) FROM address_photos WHERE address_id = $1),
	(SELECT count(*) FROM address_checklist_items WHERE address_id = $1),
	(SELECT count(*) FROM address_notes WHERE address_id = $1)",
	)
	.bind(address_id)
	.fetch_one(&db.pool)
	.await?;

	Ok(ChildCounts {
		documents: documents as usize,
		photos: photos as usize,
		checklist_items: checklist_items as usize,
		notes: notes as usize,
	})
}

/// Applies a change set in one transaction. Any failure rolls the whole set back.
pub async fn apply(db: &Db, changes: &ChangeSet) -> Result<()> {
	if changes.is_empty() {
		return Ok(());
	}

	let mut tx = db.pool.begin().await?;

	for change in changes.in_commit_order() {
		match change {
			Change::Insert(record) => {
				insert_record(&mut tx, record).await?;
				insert_children(&mut tx, record).await?;
			},
			Change::Update(record) => update_record(&mut tx, record).await?,
			Change::ReplaceChildren(record) => {
				touch_record(&mut tx, record.id, record.updated_at).await?;
				delete_children(&mut tx, record.id).await?;
				insert_children(&mut tx, record).await?;
			},
			Change::SetCurrent { address_id, is_current, at } =>
				set_current_flag(&mut tx, *address_id, *is_current, *at).await?,
			Change::DemoteOthers { keep, at } => demote_others(&mut tx, *keep, *at).await?,
			Change::Delete(address_id) => delete_record(&mut tx, *address_id).await?,
		}
	}

	tx.commit().await.map_err(Error::classify)?;

	tracing::debug!(changes = changes.len(), "Address change set committed.");

	Ok(())
}

async fn load_children(conn: &mut PgConnection, ids: &[Uuid]) -> Result<HashMap<Uuid, Children>> {
	let mut children: HashMap<Uuid, Children> = HashMap::new();

	if ids.is_empty() {
		return Ok(children);
	}

	let documents: Vec<DocumentRow> = sqlx::query_as(
		"SELECT * FROM address_documents WHERE address_id = ANY($1) ORDER BY created_at, document_id",
	)
	.bind(ids)
	.fetch_all(&mut *conn)
	.await?;

	for row in documents {
		children.entry(row.address_id).or_default().documents.push(Document {
			id: row.document_id,
			title: row.title,
			uri: row.uri,
			created_at: row.created_at,
		});
	}

	let photos: Vec<PhotoRow> = sqlx::query_as(
		"SELECT * FROM address_photos WHERE address_id = ANY($1) ORDER BY created_at, photo_id",
	)
	.bind(ids)
	.fetch_all(&mut *conn)
	.await?;

	for row in photos {
		children.entry(row.address_id).or_default().photos.push(Photo {
			id: row.photo_id,
			uri: row.uri,
			caption: row.caption,
			created_at: row.created_at,
		});
	}

	let checklist: Vec<ChecklistItemRow> = sqlx::query_as(
		"SELECT * FROM address_checklist_items WHERE address_id = ANY($1) ORDER BY position, item_id",
	)
	.bind(ids)
	.fetch_all(&mut *conn)
	.await?;

	for row in checklist {
		children.entry(row.address_id).or_default().checklist.push(ChecklistItem {
			id: row.item_id,
			title: row.title,
			done: row.done,
			position: row.position,
		});
	}

	let notes: Vec<NoteRow> = sqlx::query_as(
		"SELECT * FROM address_notes WHERE address_id = ANY($1) ORDER BY created_at, note_id",
	)
	.bind(ids)
	.fetch_all(&mut *conn)
	.await?;

	for row in notes {
		children.entry(row.address_id).or_default().notes.push(Note {
			id: row.note_id,
			body: row.body,
			created_at: row.created_at,
		});
	}

	Ok(children)
}

async fn insert_record(tx: &mut Transaction<'_, Postgres>, record: &AddressRecord) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO address_records (
	address_id,
	apartment,
	line1,
	line2,
	sub_locality,
	city,
	postal_code,
	country_name,
	country_code,
	latitude,
	longitude,
	building_type,
	owner,
	start_date,
	end_date,
	is_current,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18)",
	)
	.bind(record.id)
	.bind(record.apartment.as_deref())
	.bind(record.line1.as_str())
	.bind(record.line2.as_deref())
	.bind(record.sub_locality.as_deref())
	.bind(record.city.as_str())
	.bind(record.postal_code.as_deref())
	.bind(record.country.name.as_str())
	.bind(record.country.code.as_str())
	.bind(record.coordinate.map(|c| c.latitude))
	.bind(record.coordinate.map(|c| c.longitude))
	.bind(record.building_type.as_str())
	.bind(record.owner.as_str())
	.bind(record.start_date)
	.bind(record.end_date)
	.bind(record.is_current)
	.bind(record.created_at)
	.bind(record.updated_at)
	.execute(&mut **tx)
	.await
	.map_err(Error::classify)?;

	Ok(())
}

async fn update_record(tx: &mut Transaction<'_, Postgres>, record: &AddressRecord) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE address_records
SET
	apartment = $2,
	line1 = $3,
	line2 = $4,
	sub_locality = $5,
	city = $6,
	postal_code = $7,
	country_name = $8,
	country_code = $9,
	latitude = $10,
	longitude = $11,
	building_type = $12,
	owner = $13,
	start_date = $14,
	end_date = $15,
	is_current = $16,
	updated_at = $17
WHERE address_id = $1",
	)
	.bind(record.id)
	.bind(record.apartment.as_deref())
	.bind(record.line1.as_str())
	.bind(record.line2.as_deref())
	.bind(record.sub_locality.as_deref())
	.bind(record.city.as_str())
	.bind(record.postal_code.as_deref())
	.bind(record.country.name.as_str())
	.bind(record.country.code.as_str())
	.bind(record.coordinate.map(|c| c.latitude))
	.bind(record.coordinate.map(|c| c.longitude))
	.bind(record.building_type.as_str())
	.bind(record.owner.as_str())
	.bind(record.start_date)
	.bind(record.end_date)
	.bind(record.is_current)
	.bind(record.updated_at)
	.execute(&mut **tx)
	.await
	.map_err(Error::classify)?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Address {} does not exist.", record.id)));
	}

	Ok(())
}

async fn touch_record(
	tx: &mut Transaction<'_, Postgres>,
	address_id: Uuid,
	at: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query("UPDATE address_records SET updated_at = $2 WHERE address_id = $1")
		.bind(address_id)
		.bind(at)
		.execute(&mut **tx)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Address {address_id} does not exist.")));
	}

	Ok(())
}

async fn set_current_flag(
	tx: &mut Transaction<'_, Postgres>,
	address_id: Uuid,
	is_current: bool,
	at: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query(
		"UPDATE address_records SET is_current = $2, updated_at = $3 WHERE address_id = $1",
	)
	.bind(address_id)
	.bind(is_current)
	.bind(at)
	.execute(&mut **tx)
	.await
	.map_err(Error::classify)?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Address {address_id} does not exist.")));
	}

	Ok(())
}

/// Clears the flag on whatever rows are current at commit time, not on a snapshot of them.
async fn demote_others(
	tx: &mut Transaction<'_, Postgres>,
	keep: Uuid,
	at: OffsetDateTime,
) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE address_records
SET is_current = false, updated_at = $2
WHERE is_current AND address_id <> $1",
	)
	.bind(keep)
	.bind(at)
	.execute(&mut **tx)
	.await?;

	tracing::debug!(keep = %keep, demoted = result.rows_affected(), "Current flags cleared.");

	Ok(())
}

async fn delete_record(tx: &mut Transaction<'_, Postgres>, address_id: Uuid) -> Result<()> {
	let result = sqlx::query("DELETE FROM address_records WHERE address_id = $1")
		.bind(address_id)
		.execute(&mut **tx)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Address {address_id} does not exist.")));
	}

	Ok(())
}

async fn delete_children(tx: &mut Transaction<'_, Postgres>, address_id: Uuid) -> Result<()> {
	for table in
		["address_documents", "address_photos", "address_checklist_items", "address_notes"]
	{
		sqlx::query(&format!("DELETE FROM {table} WHERE address_id = $1"))
			.bind(address_id)
			.execute(&mut **tx)
			.await?;
	}

	Ok(())
}

async fn insert_children(tx: &mut Transaction<'_, Postgres>, record: &AddressRecord) -> Result<()> {
	for document in &record.documents {
		sqlx::query(
			"\
INSERT INTO address_documents (document_id, address_id, title, uri, created_at)
VALUES ($1,$2,$3,$4,$5)",
		)
		.bind(document.id)
		.bind(record.id)
		.bind(document.title.as_str())
		.bind(document.uri.as_str())
		.bind(document.created_at)
		.execute(&mut **tx)
		.await?;
	}
	for photo in &record.photos {
		sqlx::query(
			"\
INSERT INTO address_photos (photo_id, address_id, uri, caption, created_at)
VALUES ($1,$2,$3,$4,$5)",
		)
		.bind(photo.id)
		.bind(record.id)
		.bind(photo.uri.as_str())
		.bind(photo.caption.as_deref())
		.bind(photo.created_at)
		.execute(&mut **tx)
		.await?;
	}
	for item in &record.checklist {
		sqlx::query(
			"\
INSERT INTO address_checklist_items (item_id, address_id, title, done, position)
VALUES ($1,$2,$3,$4,$5)",
		)
		.bind(item.id)
		.bind(record.id)
		.bind(item.title.as_str())
		.bind(item.done)
		.bind(item.position)
		.execute(&mut **tx)
		.await?;
	}
	for note in &record.notes {
		sqlx::query(
			"\
INSERT INTO address_notes (note_id, address_id, body, created_at)
VALUES ($1,$2,$3,$4)",
		)
		.bind(note.id)
		.bind(record.id)
		.bind(note.body.as_str())
		.bind(note.created_at)
		.execute(&mut **tx)
		.await?;
	}

	Ok(())
}

fn into_record(row: AddressRow, children: Children) -> Result<AddressRecord> {
	let building_type = BuildingType::parse(&row.building_type).ok_or_else(|| {
		Error::InvalidArgument(format!("Unknown building type {:?}.", row.building_type))
	})?;
	let owner = Owner::parse(&row.owner)
		.ok_or_else(|| Error::InvalidArgument(format!("Unknown owner {:?}.", row.owner)))?;
	let coordinate = match (row.latitude, row.longitude) {
		(Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
		_ => None,
	};

	Ok(AddressRecord {
		id: row.address_id,
		apartment: row.apartment,
		line1: row.line1,
		line2: row.line2,
		sub_locality: row.sub_locality,
		city: row.city,
		postal_code: row.postal_code,
		country: Country { name: row.country_name, code: row.country_code },
		coordinate,
		building_type,
		owner,
		start_date: row.start_date,
		end_date: row.end_date,
		is_current: row.is_current,
		created_at: row.created_at,
		updated_at: row.updated_at,
		documents: children.documents,
		photos: children.photos,
		checklist: children.checklist,
		notes: children.notes,
	})
}

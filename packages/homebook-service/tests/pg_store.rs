use std::sync::Arc;

use homebook_config::Postgres;
use homebook_domain::{AddressChild, AddressFields, AddressRecordAssembler, Country};
use homebook_service::{AddAddressRequest, AddressBook, PgAddressStore};
use homebook_storage::db::Db;
use homebook_testkit::TestDatabase;

fn request(line1: &str, is_current: bool) -> AddAddressRequest {
	AddAddressRequest {
		fields: AddressFields {
			line1: Some(line1.to_string()),
			city: Some("Reykjavík".to_string()),
			country: Some(Country::new("Iceland", "IS")),
			is_current,
			..Default::default()
		},
		location: None,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HOMEBOOK_PG_DSN to run."]
async fn current_flag_moves_between_rows_in_postgres() {
	let Some(base_dsn) = homebook_testkit::env_dsn() else {
		eprintln!("Skipping current_flag_moves_between_rows_in_postgres; set HOMEBOOK_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = Db::connect(&Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 })
		.await
		.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let book = AddressBook::with_assembler(
		Arc::new(PgAddressStore::new(db)),
		AddressRecordAssembler::new(vec!["Redirect post".to_string()]),
	);
	let first = book.create(request("Laugavegur 1", true)).await.expect("Create failed.");
	let second = book.create(request("Laugavegur 2", true)).await.expect("Create failed.");

	assert_eq!(book.current().await.expect("current() failed.").map(|r| r.id), Some(second.id));

	book.set_current(first.id).await.expect("set_current failed.");

	assert_eq!(book.current().await.expect("current() failed.").map(|r| r.id), Some(first.id));

	book.add_child(first.id, AddressChild::Note { body: "Blue door.".to_string() })
		.await
		.expect("Attach failed.");

	let removed = book.delete(first.id).await.expect("Delete failed.");

	assert_eq!(removed.removed.notes, 1);
	assert!(removed.was_current);
	assert!(book.current().await.expect("current() failed.").is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

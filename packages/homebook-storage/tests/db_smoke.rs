use time::{OffsetDateTime, macros::date};

use homebook_config::Postgres;
use homebook_domain::{
	AddressChild, AddressFields, AddressRecord, AddressRecordAssembler, ChangeSet, Country, Owner,
};
use homebook_storage::{Error, addresses, db::Db};
use homebook_testkit::TestDatabase;

fn record(line1: &str, is_current: bool) -> AddressRecord {
	let assembler = AddressRecordAssembler::new(vec!["Redirect post".to_string()]);
	let mut record = assembler
		.build(
			&AddressFields {
				line1: Some(line1.to_string()),
				city: Some("Oslo".to_string()),
				country: Some(Country::new("Norway", "NO")),
				owner: Owner::Myself,
				start_date: Some(date!(2021 - 04 - 01)),
				is_current,
				..Default::default()
			},
			None,
			OffsetDateTime::now_utc(),
		)
		.expect("Fields should validate.");
	let now = OffsetDateTime::now_utc();

	record.attach(AddressChild::Note { body: "Top floor.".to_string() }, now);
	record.attach(AddressChild::Photo { uri: "file:///front.jpg".to_string(), caption: None }, now);
	record.attach(
		AddressChild::Document { title: "Lease".to_string(), uri: "file:///lease.pdf".to_string() },
		now,
	);

	record
}

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HOMEBOOK_PG_DSN to run."]
async fn db_connects_and_bootstraps_twice() {
	let Some(base_dsn) = homebook_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps_twice; set HOMEBOOK_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	db.ensure_schema().await.expect("Schema bootstrap must be idempotent.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name LIKE 'address_%'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 5);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HOMEBOOK_PG_DSN to run."]
async fn records_round_trip_with_children_and_cascade_on_delete() {
	let Some(base_dsn) = homebook_testkit::env_dsn() else {
		eprintln!("Skipping records_round_trip_with_children_and_cascade_on_delete.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let stored = record("Karl Johans gate 1", true);
	let mut changes = ChangeSet::new();

	changes.insert(stored.clone());
	addresses::apply(&db, &changes).await.expect("Insert should commit.");

	let loaded = addresses::load(&db, stored.id).await.expect("Load failed.").expect("Missing row.");

	assert_eq!(loaded.child_counts(), stored.child_counts());
	assert_eq!(loaded.checklist[0].title, "Redirect post");
	assert!(loaded.is_current);

	let mut changes = ChangeSet::new();

	changes.delete(stored.id);
	addresses::apply(&db, &changes).await.expect("Delete should commit.");

	assert!(addresses::load(&db, stored.id).await.expect("Load failed.").is_none());
	assert!(addresses::child_counts(&db, stored.id).await.expect("Count failed.").is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HOMEBOOK_PG_DSN to run."]
async fn second_current_row_is_rejected_and_rolled_back() {
	let Some(base_dsn) = homebook_testkit::env_dsn() else {
		eprintln!("Skipping second_current_row_is_rejected_and_rolled_back.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let first = record("Storgata 5", true);
	let mut changes = ChangeSet::new();

	changes.insert(first.clone());
	addresses::apply(&db, &changes).await.expect("Insert should commit.");

	let second = record("Storgata 7", true);
	let bystander = record("Storgata 9", false);
	let mut changes = ChangeSet::new();

	changes.insert(bystander.clone()).insert(second.clone());

	let err = addresses::apply(&db, &changes).await.expect_err("Two current rows must conflict.");

	assert!(matches!(err, Error::Conflict(_)), "Unexpected error: {err:?}");
	assert_eq!(addresses::load_all(&db).await.expect("Load failed.").len(), 1);

	let mut demoted = first.clone();

	demoted.is_current = false;

	let mut changes = ChangeSet::new();

	changes.insert(second.clone()).update(demoted);
	addresses::apply(&db, &changes).await.expect("Demotion ordered first should commit.");

	let current = addresses::load_all(&db)
		.await
		.expect("Load failed.")
		.into_iter()
		.filter(|record| record.is_current)
		.map(|record| record.id)
		.collect::<Vec<_>>();

	assert_eq!(current, vec![second.id]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set HOMEBOOK_PG_DSN to run."]
async fn demotion_only_flips_the_flag() {
	let Some(base_dsn) = homebook_testkit::env_dsn() else {
		eprintln!("Skipping demotion_only_flips_the_flag; set HOMEBOOK_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let first = record("Storgata 5", true);
	let mut changes = ChangeSet::new();

	changes.insert(first.clone());
	addresses::apply(&db, &changes).await.expect("Insert should commit.");

	let second = record("Storgata 7", true);
	let mut changes = ChangeSet::new();

	changes.insert(second.clone()).demote_others(second.id, OffsetDateTime::now_utc());
	addresses::apply(&db, &changes).await.expect("Promotion should commit.");

	let stored = addresses::load(&db, first.id).await.expect("Load failed.").expect("Row missing.");

	assert!(!stored.is_current);
	assert_eq!(stored.line1, first.line1);
	assert_eq!(stored.child_counts(), first.child_counts());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

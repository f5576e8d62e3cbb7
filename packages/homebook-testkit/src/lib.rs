mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "HOMEBOOK_PG_DSN";

/// Databases tried, in order, for `CREATE DATABASE` / `DROP DATABASE`.
const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

/// The base DSN for Postgres-backed tests, if configured.
pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// A uniquely named database created for one test.
///
/// Call [`TestDatabase::cleanup`] at the end of the test. If the value is dropped instead (for
/// example on a failed assertion), the database is dropped from a helper thread.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::InvalidDsn(err.to_string()))?;
		let (admin, mut conn) = admin_connection(&base).await?;
		let name = format!("homebook_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await.map_err(|source| {
			Error::Database { action: "create", name: name.clone(), source }
		})?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.admin, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let admin = self.admin.clone();
		let name = self.name.clone();

		// The test's runtime may already be shutting down, so drop from a fresh one.
		let outcome = thread::spawn(move || {
			Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(|err| err.to_string())
				.and_then(|runtime| {
					runtime.block_on(drop_database(&admin, &name)).map_err(|err| err.to_string())
				})
		})
		.join();

		match outcome {
			Ok(Ok(())) => {},
			Ok(Err(message)) => eprintln!("Test database {} was not dropped: {message}", self.name),
			Err(_) => eprintln!("Test database {} cleanup thread panicked.", self.name),
		}
	}
}

async fn admin_connection(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut errors = Vec::with_capacity(ADMIN_DATABASES.len());

	for database in ADMIN_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => errors.push(format!("{database}: {err}")),
		}
	}

	Err(Error::AdminUnavailable(errors.join("; ")))
}

async fn drop_database(admin: &PgConnectOptions, name: &str) -> Result<()> {
	let database_error = |action, source| Error::Database { action, name: name.to_string(), source };
	let mut conn =
		PgConnection::connect_with(admin).await.map_err(|source| database_error("connect to", source))?;

	// Pools opened by the test may still hold connections.
	sqlx::query(
		"SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await
	.map_err(|source| database_error("disconnect", source))?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.await
		.map_err(|source| database_error("drop", source))?;

	Ok(())
}

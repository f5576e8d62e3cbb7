pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid HOMEBOOK_PG_DSN: {0}")]
	InvalidDsn(String),
	#[error("No admin database reachable: {0}")]
	AdminUnavailable(String),
	#[error("Failed to {action} test database {name}: {source}")]
	Database {
		action: &'static str,
		name: String,
		#[source]
		source: sqlx::Error,
	},
}

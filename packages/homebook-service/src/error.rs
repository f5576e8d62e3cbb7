use homebook_domain::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Search provider error: {message}")]
	SearchProvider { message: String },
	#[error("Persistence commit failed: {message}")]
	PersistenceCommit { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<homebook_storage::Error> for Error {
	fn from(err: homebook_storage::Error) -> Self {
		match err {
			homebook_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			homebook_storage::Error::InvalidArgument(message) => Self::Storage { message },
			homebook_storage::Error::NotFound(message) => Self::NotFound { message },
			homebook_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::SearchProvider { message: err.to_string() }
	}
}

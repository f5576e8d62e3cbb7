#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// Unique and check violations are constraint conflicts, not transport failures.
	pub(crate) fn classify(err: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db_err) = &err
			&& (db_err.is_unique_violation() || db_err.is_check_violation())
		{
			return Self::Conflict(db_err.message().to_string());
		}

		Self::Sqlx(err)
	}
}

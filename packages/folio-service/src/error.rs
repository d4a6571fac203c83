use folio_domain::status::TransitionError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Not ready: {message}")]
	NotReady { message: String },
	#[error("Payload too large: {message}")]
	PayloadTooLarge { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	/// Another worker claimed the ingest job after this one's lease ran out.
	#[error("Lease lost: {message}")]
	LeaseLost { message: String },
}
impl Error {
	/// Retrying the same work can never succeed.
	pub fn is_permanent(&self) -> bool {
		matches!(
			self,
			Self::InvalidRequest { .. } | Self::NotFound { .. } | Self::PayloadTooLarge { .. }
		)
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<folio_storage::Error> for Error {
	fn from(err: folio_storage::Error) -> Self {
		match err {
			folio_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			folio_storage::Error::Io(inner) => Self::Storage { message: inner.to_string() },
			folio_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			folio_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: format!("{err:#}") }
	}
}

impl From<TransitionError> for Error {
	fn from(err: TransitionError) -> Self {
		Self::InvalidRequest { message: format!("Illegal status transition. {err}") }
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Storage(#[from] folio_storage::Error),
	#[error(transparent)]
	Service(#[from] folio_service::Error),
}

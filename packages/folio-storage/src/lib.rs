pub mod blobs;
pub mod chunks;
pub mod db;
pub mod documents;
pub mod jobs;
pub mod models;
pub mod schema;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

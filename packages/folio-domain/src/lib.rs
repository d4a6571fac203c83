pub mod context;
pub mod language;
pub mod prompt;
pub mod status;
pub mod summary;
pub mod text;

use serde::Serialize;
use uuid::Uuid;

use crate::{FolioService, Result, document_not_found};
use folio_domain::status::ProcessingStatus;

#[derive(Clone, Debug, Serialize)]
pub struct StatusResponse {
	pub document_id: Uuid,
	pub file_name: String,
	pub pages: i32,
	pub language: String,
	pub word_count: i64,
	pub processing_status: ProcessingStatus,
}

impl FolioService {
	pub async fn status(&self, document_id: Uuid) -> Result<StatusResponse> {
		let doc = folio_storage::documents::get_document(&self.db.pool, document_id)
			.await?
			.ok_or_else(|| document_not_found(document_id))?;
		let processing_status = doc.processing_status();

		Ok(StatusResponse {
			document_id,
			file_name: doc.file_name,
			pages: doc.pages,
			language: doc.language,
			word_count: doc.word_count,
			processing_status,
		})
	}
}

use serde::Serialize;
use uuid::Uuid;

use crate::{Error, FolioService, Result};
use folio_storage::{documents, jobs};

#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub documents: i64,
	pub ready_documents: i64,
	pub pending_jobs: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResetResponse {
	pub message: String,
}

impl FolioService {
	pub async fn health(&self) -> Result<HealthResponse> {
		let counts = documents::count_documents(&self.db.pool).await?;
		let pending_jobs = jobs::count_pending_jobs(&self.db.pool).await?;

		Ok(HealthResponse {
			status: "healthy",
			documents: counts.documents,
			ready_documents: counts.ready_documents,
			pending_jobs,
		})
	}

	/// Deletes a document with its chunks, jobs and stored file.
	pub async fn reset(&self, document_id: Uuid) -> Result<ResetResponse> {
		let doc = documents::get_document(&self.db.pool, document_id)
			.await?
			.ok_or_else(|| session_not_found(document_id))?;

		if !documents::delete_document(&self.db.pool, document_id).await? {
			return Err(session_not_found(document_id));
		}

		self.discard_blob(&doc.blob_key).await;

		tracing::info!(%document_id, "Reset document session.");

		Ok(ResetResponse { message: format!("Session {document_id} reset successfully.") })
	}
}

fn session_not_found(document_id: Uuid) -> Error {
	Error::NotFound { message: format!("Session {document_id} not found.") }
}

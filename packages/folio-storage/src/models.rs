use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::status::ProcessingStatus;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Document {
	pub document_id: Uuid,
	pub file_name: String,
	pub blob_key: String,
	pub content_bytes: i64,
	pub content_hash: String,
	pub pages: i32,
	pub language: String,
	pub language_code: String,
	pub word_count: i64,
	pub text_extraction: bool,
	pub vector_embedding: bool,
	pub ai_ready: bool,
	pub current_chunk: i32,
	pub total_chunks: i32,
	pub processing_error: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl Document {
	pub fn processing_status(&self) -> ProcessingStatus {
		ProcessingStatus {
			text_extraction: self.text_extraction,
			vector_embedding: self.vector_embedding,
			ai_ready: self.ai_ready,
			current_chunk: self.current_chunk.max(0) as u32,
			total_chunks: self.total_chunks.max(0) as u32,
			error: self.processing_error.clone(),
		}
	}
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct DocumentChunk {
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub chunk_index: i32,
	pub page_number: i32,
	pub start_offset: i32,
	pub end_offset: i32,
	pub content: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ChunkMatchRow {
	pub chunk_id: Uuid,
	pub chunk_index: i32,
	pub page_number: i32,
	pub content: String,
	pub similarity: f32,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct IngestJob {
	pub job_id: Uuid,
	pub document_id: Uuid,
	pub status: String,
	pub attempts: i32,
	pub last_error: Option<String>,
	/// Set while claimed; every later write on the job must present it.
	pub lease_id: Option<Uuid>,
	/// Next claim time, or the lease expiry while claimed.
	pub available_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct DocumentCounts {
	pub documents: i64,
	pub ready_documents: i64,
}

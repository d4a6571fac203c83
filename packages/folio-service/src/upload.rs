use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, FolioService, Result, ingest};
use folio_domain::status::ProcessingStatus;
use folio_storage::models::Document;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";
const DEFAULT_FILE_NAME: &str = "document.pdf";

#[derive(Clone, Debug)]
pub struct UploadRequest {
	pub file_name: String,
	/// Declared MIME type; `None` when the client sent none.
	pub content_type: Option<String>,
	pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UploadResponse {
	#[serde(rename = "fileName")]
	pub file_name: String,
	pub pages: i32,
	pub language: String,
	pub document_id: Uuid,
	pub processing_status: ProcessingStatus,
}

impl FolioService {
	pub async fn upload(&self, req: UploadRequest) -> Result<UploadResponse> {
		validate_upload(&req, self.cfg.ingest.max_upload_bytes)?;

		let document_id = Uuid::new_v4();
		let file_name = display_file_name(&req.file_name);
		let blob_key = format!("{document_id}/{}", sanitize_file_name(&file_name));

		self.blobs.put(&blob_key, &req.bytes).await?;

		let pages = match self.providers.pdf.extract_pages(&req.bytes).await {
			Ok(pages) if !pages.is_empty() => pages,
			Ok(_) => {
				self.discard_blob(&blob_key).await;

				return Err(invalid_pdf());
			},
			Err(err) => {
				tracing::info!(%document_id, error = %err, "Rejected unreadable PDF upload.");

				self.discard_blob(&blob_key).await;

				return Err(invalid_pdf());
			},
		};
		let prepared = ingest::prepare_document(&pages, &self.cfg);
		let now = OffsetDateTime::now_utc();
		let doc = Document {
			document_id,
			file_name: file_name.clone(),
			blob_key: blob_key.clone(),
			content_bytes: req.bytes.len() as i64,
			content_hash: blake3::hash(&req.bytes).to_hex().to_string(),
			pages: prepared.page_count,
			language: prepared.language.name.to_string(),
			language_code: prepared.language.code.to_string(),
			word_count: prepared.word_count as i64,
			text_extraction: false,
			vector_embedding: false,
			ai_ready: false,
			current_chunk: 0,
			total_chunks: 0,
			processing_error: None,
			created_at: now,
			updated_at: now,
		};
		let job_id = match self.record_upload(&doc, now).await {
			Ok(job_id) => job_id,
			Err(err) => {
				self.discard_blob(&blob_key).await;

				return Err(err);
			},
		};

		tracing::info!(
			%document_id,
			%job_id,
			pages = doc.pages,
			language = %doc.language,
			bytes = doc.content_bytes,
			"Accepted PDF upload."
		);

		let processing_status = doc.processing_status();

		Ok(UploadResponse {
			file_name,
			pages: doc.pages,
			language: doc.language,
			document_id,
			processing_status,
		})
	}

	async fn record_upload(&self, doc: &Document, now: OffsetDateTime) -> Result<Uuid> {
		let mut tx = self.db.pool.begin().await?;

		folio_storage::documents::insert_document(&mut *tx, doc).await?;

		let job_id = folio_storage::jobs::enqueue_job(&mut *tx, doc.document_id, now).await?;

		tx.commit().await?;

		Ok(job_id)
	}

	pub(crate) async fn discard_blob(&self, key: &str) {
		if let Err(err) = self.blobs.delete(key).await {
			tracing::warn!(key, error = %err, "Failed to delete blob.");
		}
	}
}

/// The name shown back to clients: the last path component with control characters removed.
pub fn display_file_name(raw: &str) -> String {
	let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
	let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
	let cleaned = cleaned.trim();

	if cleaned.trim_matches('.').is_empty() {
		return DEFAULT_FILE_NAME.to_string();
	}

	cleaned.to_string()
}

/// Reduces a client file name to a safe single path component for blob keys.
pub fn sanitize_file_name(raw: &str) -> String {
	let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
	let cleaned: String = base
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
		.collect();

	if cleaned.trim_matches('.').is_empty() {
		return DEFAULT_FILE_NAME.to_string();
	}

	cleaned
}

fn validate_upload(req: &UploadRequest, max_upload_bytes: u64) -> Result<()> {
	if let Some(content_type) = req.content_type.as_deref() {
		let mime = content_type.split(';').next().unwrap_or_default().trim();

		if !mime.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
			return Err(only_pdf());
		}
	}
	if req.bytes.is_empty() {
		return Err(Error::InvalidRequest { message: "Uploaded file is empty.".to_string() });
	}
	if req.bytes.len() as u64 > max_upload_bytes {
		return Err(Error::PayloadTooLarge {
			message: format!("Uploaded file exceeds the limit of {max_upload_bytes} bytes."),
		});
	}
	if !req.bytes.starts_with(PDF_MAGIC) {
		return Err(only_pdf());
	}

	Ok(())
}

fn only_pdf() -> Error {
	Error::InvalidRequest { message: "Only PDF files allowed.".to_string() }
}

fn invalid_pdf() -> Error {
	Error::InvalidRequest { message: "Invalid or corrupted PDF.".to_string() }
}

use std::collections::HashSet;

use sqlx::PgConnection;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, FolioService, Result, chunk_id_for, document_not_found, vector_to_pg};
use folio_chunking::{Chunk, ChunkingConfig};
use folio_config::Config;
use folio_domain::{
	language::{self, DetectedLanguage},
	status::ProcessingStatus,
	text,
};
use folio_storage::{
	chunks, documents, jobs,
	models::{Document, DocumentChunk, IngestJob},
};

/// Everything derived from extracted page text before any provider is called.
#[derive(Clone, Debug)]
pub struct PreparedDocument {
	pub page_count: i32,
	pub language: DetectedLanguage,
	pub word_count: usize,
	pub chunks: Vec<Chunk>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
	/// The document reached `ai_ready`; `embedded` chunks were written by this run.
	Ready { total_chunks: u32, embedded: u32 },
	/// The document was already ready or failed, so nothing was done.
	Skipped,
}

pub fn prepare_document(pages: &[String], cfg: &Config) -> PreparedDocument {
	let sample = language::language_sample(
		pages,
		cfg.ingest.language_sample_pages as usize,
		cfg.ingest.language_sample_chars as usize,
	);
	let chunking = ChunkingConfig {
		chunk_chars: cfg.chunking.chunk_chars as usize,
		overlap_chars: cfg.chunking.overlap_chars as usize,
		min_chunk_chars: cfg.chunking.min_chunk_chars as usize,
	};

	PreparedDocument {
		page_count: i32::try_from(pages.len()).unwrap_or(i32::MAX),
		language: language::detect_language(&sample),
		word_count: pages.iter().map(|page| text::word_count(page)).sum(),
		chunks: folio_chunking::split_pages(pages, &chunking),
	}
}

impl FolioService {
	/// Runs extraction, chunking and embedding for one document and marks it ready.
	///
	/// Chunks that already exist are skipped, so a retried run resumes where the last one
	/// stopped.
	pub async fn process_document(&self, document_id: Uuid) -> Result<IngestOutcome> {
		self.run_ingest(document_id, None).await
	}

	/// Like [`Self::process_document`], for a claimed job.
	///
	/// The job lease is renewed with every status write. Once another worker has claimed the
	/// job the run stops with [`Error::LeaseLost`] before writing anything else.
	pub async fn process_job(&self, job: &IngestJob) -> Result<IngestOutcome> {
		self.run_ingest(job.document_id, Some(job)).await
	}

	/// Records a terminal processing error on the document. Missing or finished documents are
	/// left untouched.
	pub async fn fail_document(&self, document_id: Uuid, message: &str) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		self.record_failure(&mut tx, document_id, message).await?;

		tx.commit().await?;

		Ok(())
	}

	/// Marks a claimed job failed and records `message` on its document in one transaction.
	///
	/// Returns `false`, writing nothing, when `job` no longer holds its lease.
	pub async fn fail_job(&self, job: &IngestJob, attempts: i32, message: &str) -> Result<bool> {
		let mut tx = self.db.pool.begin().await?;

		if !jobs::mark_job_failed(&mut *tx, job, attempts, message, OffsetDateTime::now_utc())
			.await?
		{
			return Ok(false);
		}

		self.record_failure(&mut tx, job.document_id, message).await?;

		tx.commit().await?;

		Ok(true)
	}

	async fn run_ingest(
		&self,
		document_id: Uuid,
		lease: Option<&IngestJob>,
	) -> Result<IngestOutcome> {
		let doc = documents::get_document(&self.db.pool, document_id)
			.await?
			.ok_or_else(|| document_not_found(document_id))?;
		let mut status = doc.processing_status();

		if status.is_failed() || status.ai_ready {
			tracing::info!(%document_id, "Document needs no processing.");

			return Ok(IngestOutcome::Skipped);
		}

		let bytes = self.blobs.get(&doc.blob_key).await?;
		let pages = self.providers.pdf.extract_pages(&bytes).await?;
		let prepared = prepare_document(&pages, &self.cfg);

		if prepared.chunks.is_empty() {
			return Err(Error::InvalidRequest {
				message: "No text could be extracted from the PDF.".to_string(),
			});
		}

		let total_chunks = u32::try_from(prepared.chunks.len()).unwrap_or(u32::MAX);

		status.mark_extracted(total_chunks)?;
		self.save_status(document_id, &status, lease).await?;

		tracing::info!(%document_id, pages = pages.len(), total_chunks, "Extracted document text.");

		let embedded = self.embed_chunks(&doc, &prepared.chunks, &mut status, lease).await?;

		status.mark_embedded()?;
		status.mark_ready()?;
		self.save_status(document_id, &status, lease).await?;

		tracing::info!(%document_id, total_chunks, embedded, "Document is ready.");

		Ok(IngestOutcome::Ready { total_chunks, embedded })
	}

	async fn record_failure(
		&self,
		conn: &mut PgConnection,
		document_id: Uuid,
		message: &str,
	) -> Result<()> {
		let Some(doc) = documents::get_document(&mut *conn, document_id).await? else {
			return Ok(());
		};
		let mut status = doc.processing_status();

		if let Err(err) = status.fail(message) {
			tracing::debug!(%document_id, error = %err, "Document status is already terminal.");

			return Ok(());
		}

		let now = OffsetDateTime::now_utc();

		documents::update_processing_status(&mut *conn, document_id, &status, now).await?;

		Ok(())
	}

	/// Renews the lease of `lease`, if any, inside the caller's transaction.
	async fn hold_lease(&self, conn: &mut PgConnection, lease: Option<&IngestJob>) -> Result<()> {
		let Some(job) = lease else {
			return Ok(());
		};
		let now = OffsetDateTime::now_utc();
		let lease_until = now + Duration::seconds(self.cfg.worker.lease_seconds);

		if !jobs::renew_lease(&mut *conn, job, lease_until, now).await? {
			return Err(Error::LeaseLost {
				message: format!("Ingest job {} was claimed by another worker.", job.job_id),
			});
		}

		Ok(())
	}

	async fn embed_chunks(
		&self,
		doc: &Document,
		all_chunks: &[Chunk],
		status: &mut ProcessingStatus,
		lease: Option<&IngestJob>,
	) -> Result<u32> {
		let document_id = doc.document_id;
		let existing: HashSet<i32> =
			chunks::list_chunk_indices(&self.db.pool, document_id).await?.into_iter().collect();
		let pending: Vec<&Chunk> =
			all_chunks.iter().filter(|chunk| !existing.contains(&chunk.chunk_index)).collect();
		let mut stored = all_chunks.len() - pending.len();

		if stored > 0 {
			tracing::info!(%document_id, stored, "Resuming partially embedded document.");
		}

		status.record_embedded(to_u32(stored))?;

		let batch_size = self.cfg.providers.embedding.batch_size.max(1) as usize;
		let mut embedded = 0_u32;

		for batch in pending.chunks(batch_size) {
			let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
			let vectors = self.embed_checked(&texts).await?;
			let mut tx = self.db.pool.begin().await?;

			self.hold_lease(&mut tx, lease).await?;

			for (chunk, vector) in batch.iter().zip(vectors.iter()) {
				let row = DocumentChunk {
					chunk_id: chunk_id_for(document_id, chunk.chunk_index),
					document_id,
					chunk_index: chunk.chunk_index,
					page_number: chunk.page_number,
					start_offset: to_i32(chunk.start_offset),
					end_offset: to_i32(chunk.end_offset),
					content: chunk.text.clone(),
				};

				chunks::insert_chunk(&mut *tx, &row, &vector_to_pg(vector)).await?;
			}

			stored += batch.len();
			embedded += to_u32(batch.len());

			status.record_embedded(to_u32(stored))?;

			let updated = documents::update_processing_status(
				&mut *tx,
				document_id,
				status,
				OffsetDateTime::now_utc(),
			)
			.await?;

			if !updated {
				return Err(document_not_found(document_id));
			}

			tx.commit().await?;

			tracing::debug!(
				%document_id,
				stored,
				total = all_chunks.len(),
				"Embedded chunk batch."
			);
		}

		Ok(embedded)
	}

	async fn save_status(
		&self,
		document_id: Uuid,
		status: &ProcessingStatus,
		lease: Option<&IngestJob>,
	) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		self.hold_lease(&mut tx, lease).await?;

		let updated = documents::update_processing_status(
			&mut *tx,
			document_id,
			status,
			OffsetDateTime::now_utc(),
		)
		.await?;

		if !updated {
			return Err(document_not_found(document_id));
		}

		tx.commit().await?;

		Ok(())
	}
}

fn to_u32(value: usize) -> u32 {
	u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_i32(value: usize) -> i32 {
	i32::try_from(value).unwrap_or(i32::MAX)
}

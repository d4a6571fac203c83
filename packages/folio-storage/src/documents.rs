use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use folio_domain::status::ProcessingStatus;

use crate::{
	Result,
	models::{Document, DocumentCounts},
};

pub async fn insert_document<'e, E>(executor: E, doc: &Document) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO documents (
	document_id,
	file_name,
	blob_key,
	content_bytes,
	content_hash,
	pages,
	language,
	language_code,
	word_count,
	text_extraction,
	vector_embedding,
	ai_ready,
	current_chunk,
	total_chunks,
	processing_error,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)",
	)
	.bind(doc.document_id)
	.bind(doc.file_name.as_str())
	.bind(doc.blob_key.as_str())
	.bind(doc.content_bytes)
	.bind(doc.content_hash.as_str())
	.bind(doc.pages)
	.bind(doc.language.as_str())
	.bind(doc.language_code.as_str())
	.bind(doc.word_count)
	.bind(doc.text_extraction)
	.bind(doc.vector_embedding)
	.bind(doc.ai_ready)
	.bind(doc.current_chunk)
	.bind(doc.total_chunks)
	.bind(doc.processing_error.as_deref())
	.bind(doc.created_at)
	.bind(doc.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_document<'e, E>(executor: E, document_id: Uuid) -> Result<Option<Document>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Document>(
		"\
SELECT
	document_id,
	file_name,
	blob_key,
	content_bytes,
	content_hash,
	pages,
	language,
	language_code,
	word_count,
	text_extraction,
	vector_embedding,
	ai_ready,
	current_chunk,
	total_chunks,
	processing_error,
	created_at,
	updated_at
FROM documents
WHERE document_id = $1
LIMIT 1",
	)
	.bind(document_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Merges a status snapshot into the stored one. Returns `false` when the document no longer
/// exists.
///
/// Flags only turn on, `current_chunk` never decreases, and an error is kept once set. A ready
/// document never takes an error, and a failed one never becomes ready.
pub async fn update_processing_status<'e, E>(
	executor: E,
	document_id: Uuid,
	status: &ProcessingStatus,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE documents
SET
	text_extraction = text_extraction OR $1,
	vector_embedding = vector_embedding OR $2,
	ai_ready = ai_ready OR ($3 AND processing_error IS NULL),
	current_chunk = GREATEST(current_chunk, $4),
	total_chunks = GREATEST(total_chunks, $5),
	processing_error = CASE WHEN ai_ready THEN processing_error
		ELSE COALESCE(processing_error, $6) END,
	updated_at = $7
WHERE document_id = $8",
	)
	.bind(status.text_extraction)
	.bind(status.vector_embedding)
	.bind(status.ai_ready)
	.bind(to_i32(status.current_chunk))
	.bind(to_i32(status.total_chunks))
	.bind(status.error.as_deref())
	.bind(now)
	.bind(document_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn delete_document<'e, E>(executor: E, document_id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM documents WHERE document_id = $1")
		.bind(document_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn count_documents<'e, E>(executor: E) -> Result<DocumentCounts>
where
	E: PgExecutor<'e>,
{
	let counts = sqlx::query_as::<_, DocumentCounts>(
		"\
SELECT
	count(*) AS documents,
	count(*) FILTER (WHERE ai_ready) AS ready_documents
FROM documents",
	)
	.fetch_one(executor)
	.await?;

	Ok(counts)
}

fn to_i32(value: u32) -> i32 {
	i32::try_from(value).unwrap_or(i32::MAX)
}

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Result,
	models::{ChunkMatchRow, DocumentChunk},
};

/// Inserts a chunk with its embedding. Existing chunks are left untouched and reported as `false`.
pub async fn insert_chunk<'e, E>(
	executor: E,
	chunk: &DocumentChunk,
	embedding: &str,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO document_chunks (
	chunk_id,
	document_id,
	chunk_index,
	page_number,
	start_offset,
	end_offset,
	content,
	embedding
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8::text::vector)
ON CONFLICT (chunk_id) DO NOTHING",
	)
	.bind(chunk.chunk_id)
	.bind(chunk.document_id)
	.bind(chunk.chunk_index)
	.bind(chunk.page_number)
	.bind(chunk.start_offset)
	.bind(chunk.end_offset)
	.bind(chunk.content.as_str())
	.bind(embedding)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn count_chunks<'e, E>(executor: E, document_id: Uuid) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM document_chunks WHERE document_id = $1")
			.bind(document_id)
			.fetch_one(executor)
			.await?;

	Ok(count)
}

pub async fn list_chunk_indices<'e, E>(executor: E, document_id: Uuid) -> Result<Vec<i32>>
where
	E: PgExecutor<'e>,
{
	let indices: Vec<i32> = sqlx::query_scalar(
		"SELECT chunk_index FROM document_chunks WHERE document_id = $1 ORDER BY chunk_index ASC",
	)
	.bind(document_id)
	.fetch_all(executor)
	.await?;

	Ok(indices)
}

/// Returns the first `limit` chunks of a document in reading order.
pub async fn list_leading_chunks<'e, E>(
	executor: E,
	document_id: Uuid,
	limit: i64,
) -> Result<Vec<DocumentChunk>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DocumentChunk>(
		"\
SELECT
	chunk_id,
	document_id,
	chunk_index,
	page_number,
	start_offset,
	end_offset,
	content
FROM document_chunks
WHERE document_id = $1
ORDER BY chunk_index ASC
LIMIT $2",
	)
	.bind(document_id)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn match_chunks<'e, E>(
	executor: E,
	query_embedding: &str,
	document_id: Uuid,
	match_count: i32,
) -> Result<Vec<ChunkMatchRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ChunkMatchRow>(
		"\
SELECT
	chunk_id,
	chunk_index,
	page_number,
	content,
	similarity
FROM match_document_chunks($1::text::vector, $2, $3)",
	)
	.bind(query_embedding)
	.bind(document_id)
	.bind(match_count)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

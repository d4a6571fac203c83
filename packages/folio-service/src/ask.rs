use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, FolioService, Result, vector_to_pg};
use folio_domain::{
	context::{self, ChunkMatch, SourceRef},
	prompt,
};

#[derive(Clone, Debug, Deserialize)]
pub struct AskRequest {
	pub question: String,
	pub document_id: Uuid,
}

#[derive(Clone, Debug, Serialize)]
pub struct AskResponse {
	pub answer: String,
	pub sources: Vec<SourceRef>,
}

impl FolioService {
	pub async fn ask(&self, req: AskRequest) -> Result<AskResponse> {
		let question = req.question.trim();

		if question.is_empty() {
			return Err(Error::InvalidRequest {
				message: "question must be non-empty.".to_string(),
			});
		}

		let doc = self.ready_document(req.document_id).await?;
		let cfg = &self.cfg.retrieval;
		let query = self.embed_checked(&[question.to_string()]).await?;
		let Some(query_vec) = query.first() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vector for the question.".to_string(),
			});
		};
		let rows = folio_storage::chunks::match_chunks(
			&self.db.pool,
			&vector_to_pg(query_vec),
			doc.document_id,
			i32::try_from(cfg.top_k).unwrap_or(i32::MAX),
		)
		.await?;
		let matches: Vec<ChunkMatch> = rows
			.into_iter()
			.map(|row| ChunkMatch {
				chunk_index: row.chunk_index,
				page_number: row.page_number,
				content: row.content,
				similarity: row.similarity,
			})
			.collect();
		let blocks = context::assemble_context(
			&matches,
			cfg.max_blocks as usize,
			cfg.max_block_chars as usize,
		);
		let messages = prompt::qa_messages(&blocks, question);
		let answer =
			self.providers.generation.generate(&self.cfg.providers.llm, &messages).await?;
		let answer = answer.trim();

		if answer.is_empty() {
			return Err(Error::Provider { message: "Model returned an empty answer.".to_string() });
		}

		let sources = if cfg.return_sources {
			context::sources_for(&blocks, cfg.source_preview_chars as usize)
		} else {
			Vec::new()
		};

		tracing::info!(
			document_id = %doc.document_id,
			matches = matches.len(),
			blocks = blocks.len(),
			"Answered question."
		);

		Ok(AskResponse { answer: answer.to_string(), sources })
	}
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, FolioService, Result};
use folio_domain::{
	prompt,
	summary::{self, SummarySection},
};
use folio_providers::generation;

const MAX_SUMMARY_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug, Deserialize)]
pub struct SummaryRequest {
	pub document_id: Uuid,
}

#[derive(Clone, Debug, Serialize)]
pub struct SummaryResponse {
	pub document_id: Uuid,
	pub summary: Vec<SummarySection>,
}

impl FolioService {
	/// Summarizes the opening chunks of a ready document as titled sections.
	///
	/// Model output without usable sections is retried; transport errors are not.
	pub async fn summarize(&self, req: SummaryRequest) -> Result<SummaryResponse> {
		let doc = self.ready_document(req.document_id).await?;
		let cfg = &self.cfg.summary;
		let leading = folio_storage::chunks::list_leading_chunks(
			&self.db.pool,
			doc.document_id,
			i64::from(cfg.max_chunks),
		)
		.await?;
		let context = summary::summary_context(
			leading.iter().map(|chunk| (chunk.page_number, chunk.content.as_str())),
			cfg.max_context_chars as usize,
		);
		let messages = prompt::summary_messages(&doc.file_name, &context);

		for attempt in 1..=MAX_SUMMARY_ATTEMPTS {
			let raw =
				self.providers.generation.generate(&self.cfg.providers.llm, &messages).await?;
			let sections = generation::extract_json(&raw)
				.map(|value| summary::parse_sections(&value))
				.unwrap_or_default();

			if !sections.is_empty() {
				tracing::info!(
					document_id = %doc.document_id,
					attempt,
					sections = sections.len(),
					"Generated summary."
				);

				return Ok(SummaryResponse { document_id: doc.document_id, summary: sections });
			}

			tracing::warn!(
				document_id = %doc.document_id,
				attempt,
				"Model output held no usable summary sections."
			);
		}

		Err(Error::Provider {
			message: format!(
				"Model returned no usable summary sections after {MAX_SUMMARY_ATTEMPTS} attempts."
			),
		})
	}
}

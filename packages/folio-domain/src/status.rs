use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
	#[error("Processing already failed: {message}.")]
	Failed { message: String },
	#[error("Processing already finished; the document is ready.")]
	AlreadyReady,
	#[error("Text extraction has not completed.")]
	NotExtracted,
	#[error("Total chunk count is already {current}; got {requested}.")]
	TotalChanged { current: u32, requested: u32 },
	#[error("Embedded chunk count {count} is below the recorded {current}.")]
	ChunkRegressed { count: u32, current: u32 },
	#[error("Embedded chunk count {count} exceeds the total of {total}.")]
	ChunkOutOfRange { count: u32, total: u32 },
	#[error("Only {current} of {total} chunks are embedded.")]
	EmbeddingIncomplete { current: u32, total: u32 },
	#[error("Vector embedding has not completed.")]
	NotEmbedded,
}

/// Progress of one document through the background pipeline.
///
/// Flags only move from `false` to `true`, `current_chunk` never decreases and never exceeds
/// `total_chunks`, and a recorded `error` is terminal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
	pub text_extraction: bool,
	pub vector_embedding: bool,
	pub ai_ready: bool,
	pub current_chunk: u32,
	pub total_chunks: u32,
	pub error: Option<String>,
}
impl ProcessingStatus {
	pub fn is_failed(&self) -> bool {
		self.error.is_some()
	}

	pub fn mark_extracted(&mut self, total_chunks: u32) -> Result<(), TransitionError> {
		self.ensure_open()?;

		if self.text_extraction && self.total_chunks != total_chunks {
			return Err(TransitionError::TotalChanged {
				current: self.total_chunks,
				requested: total_chunks,
			});
		}

		self.text_extraction = true;
		self.total_chunks = total_chunks;

		Ok(())
	}

	pub fn record_embedded(&mut self, count: u32) -> Result<(), TransitionError> {
		self.ensure_open()?;

		if !self.text_extraction {
			return Err(TransitionError::NotExtracted);
		}
		if count < self.current_chunk {
			return Err(TransitionError::ChunkRegressed { count, current: self.current_chunk });
		}
		if count > self.total_chunks {
			return Err(TransitionError::ChunkOutOfRange { count, total: self.total_chunks });
		}

		self.current_chunk = count;

		Ok(())
	}

	pub fn mark_embedded(&mut self) -> Result<(), TransitionError> {
		self.ensure_open()?;

		if !self.text_extraction {
			return Err(TransitionError::NotExtracted);
		}
		if self.current_chunk != self.total_chunks {
			return Err(TransitionError::EmbeddingIncomplete {
				current: self.current_chunk,
				total: self.total_chunks,
			});
		}

		self.vector_embedding = true;

		Ok(())
	}

	pub fn mark_ready(&mut self) -> Result<(), TransitionError> {
		if let Some(message) = &self.error {
			return Err(TransitionError::Failed { message: message.clone() });
		}
		if !self.vector_embedding {
			return Err(TransitionError::NotEmbedded);
		}

		self.ai_ready = true;

		Ok(())
	}

	pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
		self.ensure_open()?;

		self.error = Some(message.into());

		Ok(())
	}

	fn ensure_open(&self) -> Result<(), TransitionError> {
		if let Some(message) = &self.error {
			return Err(TransitionError::Failed { message: message.clone() });
		}
		if self.ai_ready {
			return Err(TransitionError::AlreadyReady);
		}

		Ok(())
	}
}

pub mod admin;
pub mod ask;
pub mod ingest;
pub mod status;
pub mod summary;
pub mod upload;

mod error;

pub use admin::{HealthResponse, ResetResponse};
pub use ask::{AskRequest, AskResponse};
pub use error::{Error, Result};
pub use ingest::{IngestOutcome, PreparedDocument, prepare_document};
pub use status::StatusResponse;
pub use summary::{SummaryRequest, SummaryResponse};
pub use upload::{UploadRequest, UploadResponse, display_file_name, sanitize_file_name};

use std::{future::Future, pin::Pin, sync::Arc};

use color_eyre::eyre;
use serde_json::Value;
use uuid::Uuid;

use folio_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use folio_providers::{embedding, generation, pdf};
use folio_storage::{blobs::BlobStore, db::Db, models::Document};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait PdfExtractor
where
	Self: Send + Sync,
{
	/// Returns the text of every page, in page order.
	fn extract_pages<'a>(
		&'a self,
		bytes: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
	pub pdf: Arc<dyn PdfExtractor>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
		pdf: Arc<dyn PdfExtractor>,
	) -> Self {
		Self { embedding, generation, pdf }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider.clone(), pdf: provider }
	}
}

pub struct FolioService {
	pub cfg: Config,
	pub db: Db,
	pub blobs: BlobStore,
	pub providers: Providers,
}
impl FolioService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, Providers::default())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		let blobs = BlobStore::new(&cfg.storage.blobs);

		Self { cfg, db, blobs, providers }
	}

	/// Embeds `texts`, checking the vector count and every vector's dimension.
	pub(crate) async fn embed_checked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let cfg = &self.cfg.providers.embedding;
		let vectors = self.providers.embedding.embed(cfg, texts).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} inputs.",
					vectors.len(),
					texts.len()
				),
			});
		}
		if let Some(vec) = vectors.iter().find(|vec| vec.len() != cfg.dimensions as usize) {
			return Err(Error::Provider {
				message: format!(
					"Embedding dimension {} does not match configured dimensions {}.",
					vec.len(),
					cfg.dimensions
				),
			});
		}

		Ok(vectors)
	}

	/// Loads a document that can serve questions and summaries.
	pub(crate) async fn ready_document(&self, document_id: Uuid) -> Result<Document> {
		let doc = folio_storage::documents::get_document(&self.db.pool, document_id)
			.await?
			.ok_or_else(|| document_not_found(document_id))?;

		if let Some(err) = doc.processing_error.as_deref() {
			return Err(Error::NotReady {
				message: format!("Processing of document {document_id} failed: {err}"),
			});
		}
		if !doc.ai_ready {
			return Err(Error::NotReady {
				message: format!(
					"Document {document_id} is still being processed. Check its processing status."
				),
			});
		}

		Ok(doc)
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate(cfg, messages))
	}
}
impl PdfExtractor for DefaultProviders {
	fn extract_pages<'a>(
		&'a self,
		bytes: &'a [u8],
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		let owned = bytes.to_vec();

		Box::pin(async move {
			tokio::task::spawn_blocking(move || pdf::extract_pages(&owned))
				.await
				.map_err(|err| eyre::eyre!("PDF extraction task failed: {err}."))?
		})
	}
}

pub fn chunk_id_for(document_id: Uuid, chunk_index: i32) -> Uuid {
	let name = format!("{document_id}:{chunk_index}");

	Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

pub(crate) fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub(crate) fn document_not_found(document_id: Uuid) -> Error {
	Error::NotFound {
		message: format!("Document session {document_id} not found. Please upload the PDF again."),
	}
}

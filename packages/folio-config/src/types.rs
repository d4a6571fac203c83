use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub ingest: Ingest,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub summary: Summary,
	#[serde(default)]
	pub worker: Worker,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Run the ingest worker loop inside the API process.
	#[serde(default)]
	pub embedded_worker: bool,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub blobs: Blobs,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Blobs {
	/// Directory that holds uploaded PDFs.
	pub root: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	#[serde(default = "default_embedding_batch_size")]
	pub batch_size: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ingest {
	pub max_upload_bytes: u64,
	pub language_sample_pages: u32,
	pub language_sample_chars: u32,
}
impl Default for Ingest {
	fn default() -> Self {
		Self {
			max_upload_bytes: 32 * 1_024 * 1_024,
			language_sample_pages: 3,
			language_sample_chars: 4_096,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub chunk_chars: u32,
	pub overlap_chars: u32,
	pub min_chunk_chars: u32,
}
impl Default for Chunking {
	fn default() -> Self {
		Self { chunk_chars: 1_500, overlap_chars: 300, min_chunk_chars: 50 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub max_blocks: u32,
	pub max_block_chars: u32,
	pub return_sources: bool,
	pub source_preview_chars: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			top_k: 15,
			max_blocks: 5,
			max_block_chars: 1_200,
			return_sources: true,
			source_preview_chars: 200,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Summary {
	pub max_chunks: u32,
	pub max_context_chars: u32,
}
impl Default for Summary {
	fn default() -> Self {
		Self { max_chunks: 20, max_context_chars: 24_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Worker {
	pub poll_interval_ms: u64,
	pub lease_seconds: i64,
	pub max_attempts: u32,
}
impl Default for Worker {
	fn default() -> Self {
		Self { poll_interval_ms: 500, lease_seconds: 300, max_attempts: 3 }
	}
}

fn default_embedding_batch_size() -> u32 {
	32
}

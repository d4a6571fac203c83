mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Blobs, Chunking, Config, EmbeddingProviderConfig, Ingest, LlmProviderConfig, Postgres,
	Providers, Retrieval, Service, Storage, Summary, Worker,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.blobs.root.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.blobs.root must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.batch_size == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.batch_size must be greater than zero.".to_string(),
		});
	}

	let temperature = cfg.providers.llm.temperature;

	if !temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&temperature) {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.ingest.max_upload_bytes == 0 {
		return Err(Error::Validation {
			message: "ingest.max_upload_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.language_sample_pages == 0 {
		return Err(Error::Validation {
			message: "ingest.language_sample_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.chunk_chars == 0 {
		return Err(Error::Validation {
			message: "chunking.chunk_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.overlap_chars >= cfg.chunking.chunk_chars {
		return Err(Error::Validation {
			message: "chunking.overlap_chars must be less than chunking.chunk_chars.".to_string(),
		});
	}
	if cfg.chunking.min_chunk_chars > cfg.chunking.chunk_chars {
		return Err(Error::Validation {
			message: "chunking.min_chunk_chars must not exceed chunking.chunk_chars.".to_string(),
		});
	}

	for (label, value) in [
		("retrieval.top_k", cfg.retrieval.top_k),
		("retrieval.max_blocks", cfg.retrieval.max_blocks),
		("retrieval.max_block_chars", cfg.retrieval.max_block_chars),
		("summary.max_chunks", cfg.summary.max_chunks),
		("summary.max_context_chars", cfg.summary.max_context_chars),
		("worker.max_attempts", cfg.worker.max_attempts),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.lease_seconds <= 0 {
		return Err(Error::Validation {
			message: "worker.lease_seconds must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	for base in [&mut cfg.providers.embedding.api_base, &mut cfg.providers.llm.api_base] {
		while base.ends_with('/') {
			base.pop();
		}
	}
}

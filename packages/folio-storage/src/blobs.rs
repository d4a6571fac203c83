use std::{
	io::ErrorKind,
	path::{Component, Path, PathBuf},
};

use tokio::fs;

use crate::{Error, Result};

/// Stores uploaded files under a root directory, addressed by relative keys.
#[derive(Clone, Debug)]
pub struct BlobStore {
	root: PathBuf,
}
impl BlobStore {
	pub fn new(cfg: &folio_config::Blobs) -> Self {
		Self { root: PathBuf::from(&cfg.root) }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
		let path = self.resolve(key)?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).await?;
		}

		fs::write(&path, bytes).await?;

		tracing::debug!(key, bytes = bytes.len(), "Stored blob.");

		Ok(())
	}

	pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
		let path = self.resolve(key)?;

		match fs::read(&path).await {
			Ok(bytes) => Ok(bytes),
			Err(err) if err.kind() == ErrorKind::NotFound =>
				Err(Error::NotFound(format!("Blob {key} does not exist."))),
			Err(err) => Err(err.into()),
		}
	}

	/// Removes a blob and its directory when that becomes empty. Missing blobs are ignored.
	pub async fn delete(&self, key: &str) -> Result<()> {
		let path = self.resolve(key)?;

		match fs::remove_file(&path).await {
			Ok(()) => {},
			Err(err) if err.kind() == ErrorKind::NotFound => {},
			Err(err) => return Err(err.into()),
		}

		if let Some(parent) = path.parent()
			&& parent != self.root
		{
			// Fails while other blobs share the directory.
			let _ = fs::remove_dir(parent).await;
		}

		Ok(())
	}

	fn resolve(&self, key: &str) -> Result<PathBuf> {
		let relative = Path::new(key);

		if key.is_empty()
			|| !relative.components().all(|component| matches!(component, Component::Normal(_)))
		{
			return Err(Error::InvalidArgument(format!("Blob key {key:?} is not a relative path.")));
		}

		Ok(self.root.join(relative))
	}
}

#[cfg(test)]
mod tests {
	use std::{env, path::PathBuf};

	use uuid::Uuid;

	use super::BlobStore;
	use crate::Error;

	fn temp_store() -> (BlobStore, PathBuf) {
		let root = env::temp_dir().join(format!("folio_blobs_{}", Uuid::new_v4().simple()));
		let store = BlobStore::new(&folio_config::Blobs { root: root.display().to_string() });

		(store, root)
	}

	#[tokio::test]
	async fn put_get_delete_cycle() {
		let (store, root) = temp_store();

		store.put("doc/report.pdf", b"%PDF-1.4").await.expect("Failed to put blob.");

		assert_eq!(store.get("doc/report.pdf").await.expect("Failed to get blob."), b"%PDF-1.4");

		store.delete("doc/report.pdf").await.expect("Failed to delete blob.");

		assert!(matches!(store.get("doc/report.pdf").await, Err(Error::NotFound(_))));
		assert!(!root.join("doc").exists());

		store.delete("doc/report.pdf").await.expect("Deleting a missing blob must succeed.");

		let _ = std::fs::remove_dir_all(root);
	}

	#[tokio::test]
	async fn rejects_escaping_keys() {
		let (store, _root) = temp_store();

		for key in ["", "../etc/passwd", "/abs/path.pdf", "a/../../b"] {
			assert!(
				matches!(store.put(key, b"x").await, Err(Error::InvalidArgument(_))),
				"Key {key:?} must be rejected."
			);
		}
	}
}

//! Advisory file locking
//!
//! One lock file per name inside the configured directory. Exclusion comes
//! from OS advisory locks (via `fs2`), so it spans processes on the same
//! host and ends automatically when the holding descriptor closes, crash
//! included.

use crate::backend::{HeldLock, LockBackend};
use crate::error::LockError;
use async_trait::async_trait;
use fs2::FileExt;
use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

#[derive(Debug)]
pub struct FileLocks {
	dir: PathBuf,
}

impl FileLocks {
	pub fn new(dir: Option<PathBuf>) -> Self {
		let dir = dir.unwrap_or_else(|| std::env::temp_dir().join("grappelli-locks"));
		Self { dir }
	}

	/// Lock file path for a name.
	///
	/// The readable head keeps files identifiable; the hash suffix keeps
	/// distinct names distinct after sanitization.
	fn lock_path(&self, name: &str) -> PathBuf {
		let mut hasher = DefaultHasher::new();
		name.hash(&mut hasher);
		let head: String = name
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
			.take(48)
			.collect();
		self.dir.join(format!("{}-{:016x}.lock", head, hasher.finish()))
	}
}

#[async_trait]
impl LockBackend for FileLocks {
	async fn acquire(&self, name: &str) -> Result<HeldLock, LockError> {
		let dir = self.dir.clone();
		let path = self.lock_path(name);

		// lock_exclusive blocks its OS thread until the lock is granted
		let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
			std::fs::create_dir_all(&dir)?;
			let file = OpenOptions::new()
				.read(true)
				.write(true)
				.create(true)
				.truncate(false)
				.open(&path)?;
			file.lock_exclusive()?;
			Ok(file)
		})
		.await
		.map_err(|e| LockError::Backend(format!("file lock task failed: {}", e)))??;

		Ok(HeldLock::File(file))
	}

	async fn release(&self, name: &str, held: HeldLock) -> bool {
		match held {
			// The lock file stays in place: unlinking it would let a fresh
			// open acquire alongside an existing holder
			HeldLock::File(file) => match FileExt::unlock(&file) {
				Ok(()) => true,
				Err(e) => {
					tracing::warn!(name = %name, error = %e, "file unlock failed");
					false
				}
			},
			_ => false,
		}
	}

	fn kind(&self) -> &'static str {
		"file"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn acquire_creates_the_lock_directory() {
		let root = tempfile::tempdir().unwrap();
		let backend = FileLocks::new(Some(root.path().join("nested/locks")));

		let held = backend.acquire("fresh").await.unwrap();
		assert!(root.path().join("nested/locks").is_dir());
		assert!(backend.release("fresh", held).await);
	}

	#[tokio::test]
	async fn same_name_blocks_until_released() {
		let root = tempfile::tempdir().unwrap();
		let backend = std::sync::Arc::new(FileLocks::new(Some(root.path().to_path_buf())));

		let first = backend.acquire("serial").await.unwrap();

		let contender = {
			let backend = std::sync::Arc::clone(&backend);
			tokio::spawn(async move {
				let held = backend.acquire("serial").await.unwrap();
				backend.release("serial", held).await
			})
		};

		// The contender cannot finish while the lock is held
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert!(!contender.is_finished());

		assert!(backend.release("serial", first).await);
		assert!(tokio::time::timeout(Duration::from_secs(5), contender)
			.await
			.unwrap()
			.unwrap());
	}

	#[tokio::test]
	async fn distinct_names_use_distinct_files() {
		let root = tempfile::tempdir().unwrap();
		let backend = FileLocks::new(Some(root.path().to_path_buf()));

		assert_ne!(backend.lock_path("a/b"), backend.lock_path("a_b"));

		let first = backend.acquire("a/b").await.unwrap();
		let second = backend.acquire("a_b").await.unwrap();
		assert!(backend.release("a/b", first).await);
		assert!(backend.release("a_b", second).await);
	}

	#[tokio::test]
	async fn release_rejects_foreign_holds() {
		let root = tempfile::tempdir().unwrap();
		let backend = FileLocks::new(Some(root.path().to_path_buf()));
		assert!(
			!backend
				.release("anything", HeldLock::Claim { key: "k".to_string() })
				.await
		);
	}
}

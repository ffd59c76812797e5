//! File-based session storage
//!
//! One file per session id inside the configured directory. Suits single
//! host deployments where sessions must outlive the process.

use super::{gc_cutoff, split_stamped, stamp, SessionHandler};
use crate::error::SessionResult;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

const FILE_EXTENSION: &str = "session";

#[derive(Debug, Clone)]
pub struct FileHandler {
	dir: PathBuf,
}

impl FileHandler {
	pub fn new(dir: Option<PathBuf>) -> Self {
		let dir = dir.unwrap_or_else(|| std::env::temp_dir().join("grappelli-sessions"));
		Self { dir }
	}

	/// Row file path for a session id.
	///
	/// The readable head keeps files identifiable; the hash suffix keeps
	/// distinct ids distinct after sanitization.
	fn row_path(&self, id: &str) -> PathBuf {
		let mut hasher = DefaultHasher::new();
		id.hash(&mut hasher);
		let head: String = id
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
			.take(48)
			.collect();
		self.dir
			.join(format!("{}-{:016x}.{}", head, hasher.finish(), FILE_EXTENSION))
	}
}

#[async_trait]
impl SessionHandler for FileHandler {
	async fn open(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn close(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn read(&self, id: &str) -> SessionResult<Option<Vec<u8>>> {
		match tokio::fs::read(self.row_path(id)).await {
			Ok(stored) => Ok(split_stamped(&stored).map(|(_, payload)| payload.to_vec())),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn write(&self, id: &str, payload: &[u8]) -> SessionResult<()> {
		tokio::fs::create_dir_all(&self.dir).await?;
		tokio::fs::write(self.row_path(id), stamp(payload)).await?;
		Ok(())
	}

	async fn destroy(&self, id: &str) -> SessionResult<bool> {
		match tokio::fs::remove_file(self.row_path(id)).await {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
			Err(e) => Err(e.into()),
		}
	}

	async fn gc(&self, max_age: Duration) -> SessionResult<usize> {
		let mut dir = match tokio::fs::read_dir(&self.dir).await {
			Ok(dir) => dir,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(e.into()),
		};

		let cutoff = gc_cutoff(max_age);
		let mut removed = 0;
		while let Some(entry) = dir.next_entry().await? {
			let path = entry.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
				continue;
			}

			let stored = match tokio::fs::read(&path).await {
				Ok(stored) => stored,
				// Raced with a destroy; nothing left to age out
				Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
				Err(e) => return Err(e.into()),
			};

			let stale = match split_stamped(&stored) {
				Some((ts, _)) => ts < cutoff,
				None => true,
			};
			if stale && tokio::fs::remove_file(&path).await.is_ok() {
				removed += 1;
			}
		}
		Ok(removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn write_creates_the_directory_and_read_round_trips() {
		let root = tempfile::tempdir().unwrap();
		let handler = FileHandler::new(Some(root.path().join("nested/sessions")));

		handler.write("abc", b"payload").await.unwrap();
		assert!(root.path().join("nested/sessions").is_dir());
		assert_eq!(handler.read("abc").await.unwrap(), Some(b"payload".to_vec()));
	}

	#[tokio::test]
	async fn missing_rows_read_as_absent() {
		let root = tempfile::tempdir().unwrap();
		let handler = FileHandler::new(Some(root.path().to_path_buf()));
		assert_eq!(handler.read("nobody").await.unwrap(), None);
	}

	#[tokio::test]
	async fn destroy_reports_row_presence() {
		let root = tempfile::tempdir().unwrap();
		let handler = FileHandler::new(Some(root.path().to_path_buf()));

		handler.write("abc", b"1").await.unwrap();
		assert!(handler.destroy("abc").await.unwrap());
		assert!(!handler.destroy("abc").await.unwrap());
	}

	#[tokio::test]
	async fn ids_map_to_distinct_files_after_sanitization() {
		let root = tempfile::tempdir().unwrap();
		let handler = FileHandler::new(Some(root.path().to_path_buf()));
		assert_ne!(handler.row_path("a/b"), handler.row_path("a_b"));
	}

	#[tokio::test]
	async fn gc_drops_stale_rows_and_leaves_foreign_files_alone() {
		let root = tempfile::tempdir().unwrap();
		let handler = FileHandler::new(Some(root.path().to_path_buf()));

		handler.write("fresh", b"1").await.unwrap();

		let mut stale = 1000u32.to_be_bytes().to_vec();
		stale.extend_from_slice(b"old");
		tokio::fs::write(handler.row_path("stale"), &stale).await.unwrap();

		tokio::fs::write(root.path().join("unrelated.txt"), b"keep").await.unwrap();

		assert_eq!(handler.gc(Duration::from_secs(60)).await.unwrap(), 1);
		assert_eq!(handler.read("fresh").await.unwrap(), Some(b"1".to_vec()));
		assert_eq!(handler.read("stale").await.unwrap(), None);
		assert!(root.path().join("unrelated.txt").is_file());
	}

	#[tokio::test]
	async fn gc_on_a_missing_directory_is_a_no_op() {
		let root = tempfile::tempdir().unwrap();
		let handler = FileHandler::new(Some(root.path().join("never-created")));
		assert_eq!(handler.gc(Duration::from_secs(60)).await.unwrap(), 0);
	}
}

//! Process-local session storage

use super::{gc_cutoff, split_stamped, stamp, SessionHandler};
use crate::error::SessionResult;
use async_trait::async_trait;
use grappelli_store::InMemoryStore;
use std::time::Duration;

const KEY_PREFIX: &str = "sessions/";

/// Handler backed by a shared in-memory map.
///
/// Clones share the underlying map, so one instance can stand in for a
/// whole deployment in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryHandler {
	store: InMemoryStore,
}

impl MemoryHandler {
	pub fn new() -> Self {
		Self::default()
	}

	fn row_key(id: &str) -> String {
		format!("{}{}", KEY_PREFIX, id)
	}
}

#[async_trait]
impl SessionHandler for MemoryHandler {
	async fn open(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn close(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn read(&self, id: &str) -> SessionResult<Option<Vec<u8>>> {
		let stored = self.store.get(&Self::row_key(id)).await;
		Ok(stored
			.as_deref()
			.and_then(split_stamped)
			.map(|(_, payload)| payload.to_vec()))
	}

	async fn write(&self, id: &str, payload: &[u8]) -> SessionResult<()> {
		self.store.set(&Self::row_key(id), &stamp(payload), 0).await;
		Ok(())
	}

	async fn destroy(&self, id: &str) -> SessionResult<bool> {
		Ok(self.store.delete(&Self::row_key(id)).await)
	}

	async fn gc(&self, max_age: Duration) -> SessionResult<usize> {
		let cutoff = gc_cutoff(max_age);
		let mut removed = 0;
		for key in self.store.keys_with_prefix(KEY_PREFIX).await {
			let stale = match self.store.get(&key).await.as_deref().map(split_stamped) {
				Some(Some((ts, _))) => ts < cutoff,
				// Unstampable rows are dead weight and can go too
				Some(None) => true,
				None => false,
			};
			if stale && self.store.delete(&key).await {
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
	async fn read_returns_what_write_stored() {
		let handler = MemoryHandler::new();
		handler.write("abc", b"payload").await.unwrap();
		assert_eq!(handler.read("abc").await.unwrap(), Some(b"payload".to_vec()));
		assert_eq!(handler.read("missing").await.unwrap(), None);
	}

	#[tokio::test]
	async fn destroy_reports_row_presence() {
		let handler = MemoryHandler::new();
		handler.write("abc", b"1").await.unwrap();
		assert!(handler.destroy("abc").await.unwrap());
		assert!(!handler.destroy("abc").await.unwrap());
		assert_eq!(handler.read("abc").await.unwrap(), None);
	}

	#[tokio::test]
	async fn clones_observe_each_other() {
		let handler = MemoryHandler::new();
		let twin = handler.clone();
		twin.write("shared", b"2").await.unwrap();
		assert_eq!(handler.read("shared").await.unwrap(), Some(b"2".to_vec()));
	}

	#[tokio::test]
	async fn gc_drops_only_stale_rows() {
		let handler = MemoryHandler::new();
		handler.write("fresh", b"1").await.unwrap();

		// Plant a row whose stamp is far in the past
		let mut stale = 1000u32.to_be_bytes().to_vec();
		stale.extend_from_slice(b"old");
		handler.store.set("sessions/stale", &stale, 0).await;

		assert_eq!(handler.gc(Duration::from_secs(60)).await.unwrap(), 1);
		assert_eq!(handler.read("fresh").await.unwrap(), Some(b"1".to_vec()));
		assert_eq!(handler.read("stale").await.unwrap(), None);
	}

	#[tokio::test]
	async fn gc_ignores_rows_inside_the_age_limit() {
		let handler = MemoryHandler::new();
		handler.write("a", b"1").await.unwrap();
		handler.write("b", b"2").await.unwrap();
		assert_eq!(handler.gc(Duration::from_secs(3600)).await.unwrap(), 0);
	}
}

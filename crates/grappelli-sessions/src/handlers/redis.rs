//! Redis session storage
//!
//! All rows live in one hash, one field per session id. The hash keeps the
//! session namespace enumerable, so garbage collection walks fields instead
//! of needing a separate index.

use super::{gc_cutoff, split_stamped, stamp, SessionHandler};
use crate::error::SessionResult;
use async_trait::async_trait;
use grappelli_store::RedisStore;
use std::sync::Arc;
use std::time::Duration;

const SESSIONS_HASH: &str = "grappelli:sessions";

#[derive(Debug, Clone)]
pub struct RedisHandler {
	store: Arc<RedisStore>,
}

impl RedisHandler {
	pub fn new(store: Arc<RedisStore>) -> Self {
		Self { store }
	}
}

#[async_trait]
impl SessionHandler for RedisHandler {
	async fn open(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn close(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn read(&self, id: &str) -> SessionResult<Option<Vec<u8>>> {
		let stored = self.store.hash_get(SESSIONS_HASH, id).await?;
		Ok(stored
			.as_deref()
			.and_then(split_stamped)
			.map(|(_, payload)| payload.to_vec()))
	}

	async fn write(&self, id: &str, payload: &[u8]) -> SessionResult<()> {
		self.store.hash_set(SESSIONS_HASH, id, &stamp(payload)).await?;
		Ok(())
	}

	async fn destroy(&self, id: &str) -> SessionResult<bool> {
		Ok(self.store.hash_delete(SESSIONS_HASH, id).await?)
	}

	async fn gc(&self, max_age: Duration) -> SessionResult<usize> {
		let cutoff = gc_cutoff(max_age);
		let mut removed = 0;
		for id in self.store.hash_fields(SESSIONS_HASH).await? {
			let stale = match self
				.store
				.hash_get(SESSIONS_HASH, &id)
				.await?
				.as_deref()
				.map(split_stamped)
			{
				Some(Some((ts, _))) => ts < cutoff,
				Some(None) => true,
				// Raced with a destroy between the field listing and the read
				None => continue,
			};
			if stale && self.store.hash_delete(SESSIONS_HASH, &id).await? {
				removed += 1;
			}
		}
		Ok(removed)
	}
}

//! Memcached session storage
//!
//! One cache entry per session id. Memcached cannot enumerate keys, so the
//! handler keeps a JSON index of live ids under a reserved key; index
//! rewrites are serialized through a cluster lock. Locking is best-effort:
//! when no usable backend exists the index is updated unguarded.

use super::{gc_cutoff, split_stamped, stamp, SessionHandler};
use crate::error::SessionResult;
use async_trait::async_trait;
use grappelli_codec::SerializationError;
use grappelli_conf::Settings;
use grappelli_locks::Semaphore;
use grappelli_store::MemcachedStore;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

const KEY_PREFIX: &str = "grappelli.sessions";
const INDEX_KEY: &str = "grappelli.sessions.index";
const INDEX_LOCK: &str = "sessions-index";

#[derive(Debug, Clone)]
pub struct MemcachedHandler {
	store: Arc<MemcachedStore>,
	settings: Arc<Settings>,
}

impl MemcachedHandler {
	pub fn new(store: Arc<MemcachedStore>, settings: Arc<Settings>) -> Self {
		Self { store, settings }
	}

	/// Cache key for a session id, safe for the memcached ASCII protocol.
	///
	/// The readable head keeps entries identifiable; the hash suffix keeps
	/// distinct ids distinct after sanitization.
	fn row_key(id: &str) -> String {
		let mut hasher = DefaultHasher::new();
		id.hash(&mut hasher);
		let head: String = id
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
			.take(48)
			.collect();
		format!("{}.{}.{:016x}", KEY_PREFIX, head, hasher.finish())
	}

	/// Take the cluster lock that serializes index rewrites.
	///
	/// The returned instance may be unlocked when no backend is usable; the
	/// rewrite then proceeds unguarded rather than failing the request.
	async fn index_guard(&self) -> Semaphore {
		let mut guard = Semaphore::cluster(INDEX_LOCK, Arc::clone(&self.settings));
		if !guard.lock().await {
			tracing::warn!("session index lock unavailable; rewriting the index unguarded");
		}
		guard
	}

	async fn read_index(&self) -> SessionResult<Vec<String>> {
		let Some(raw) = self.store.get(INDEX_KEY).await? else {
			return Ok(Vec::new());
		};
		match serde_json::from_slice(&raw) {
			Ok(ids) => Ok(ids),
			Err(e) => {
				// Orphaned rows age out of the cache on their own
				tracing::warn!(error = %e, "session index unreadable; starting a fresh one");
				Ok(Vec::new())
			}
		}
	}

	async fn write_index(&self, ids: &[String]) -> SessionResult<()> {
		let payload = serde_json::to_vec(ids).map_err(SerializationError::from)?;
		self.store.set(INDEX_KEY, &payload, 0).await?;
		Ok(())
	}

	async fn index_insert(&self, id: &str) -> SessionResult<()> {
		let mut guard = self.index_guard().await;
		let mut ids = self.read_index().await?;
		if !ids.iter().any(|known| known == id) {
			ids.push(id.to_string());
			self.write_index(&ids).await?;
		}
		guard.unlock().await;
		Ok(())
	}

	async fn index_remove(&self, id: &str) -> SessionResult<()> {
		let mut guard = self.index_guard().await;
		let mut ids = self.read_index().await?;
		let before = ids.len();
		ids.retain(|known| known != id);
		if ids.len() != before {
			self.write_index(&ids).await?;
		}
		guard.unlock().await;
		Ok(())
	}
}

#[async_trait]
impl SessionHandler for MemcachedHandler {
	async fn open(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn close(&self) -> SessionResult<()> {
		Ok(())
	}

	async fn read(&self, id: &str) -> SessionResult<Option<Vec<u8>>> {
		let stored = self.store.get(&Self::row_key(id)).await?;
		Ok(stored
			.as_deref()
			.and_then(split_stamped)
			.map(|(_, payload)| payload.to_vec()))
	}

	async fn write(&self, id: &str, payload: &[u8]) -> SessionResult<()> {
		self.store.set(&Self::row_key(id), &stamp(payload), 0).await?;
		self.index_insert(id).await
	}

	async fn destroy(&self, id: &str) -> SessionResult<bool> {
		let existed = self.store.delete(&Self::row_key(id)).await?;
		self.index_remove(id).await?;
		Ok(existed)
	}

	async fn gc(&self, max_age: Duration) -> SessionResult<usize> {
		let cutoff = gc_cutoff(max_age);
		let mut guard = self.index_guard().await;

		let ids = self.read_index().await?;
		let mut kept = Vec::with_capacity(ids.len());
		let mut removed = 0;

		for id in ids {
			let row_key = Self::row_key(&id);
			let stale = match self.store.get(&row_key).await?.as_deref().map(split_stamped) {
				Some(Some((ts, _))) => ts < cutoff,
				Some(None) => true,
				// Row already evicted; just drop the index entry
				None => continue,
			};
			if stale {
				if self.store.delete(&row_key).await? {
					removed += 1;
				}
			} else {
				kept.push(id);
			}
		}

		self.write_index(&kept).await?;
		guard.unlock().await;
		Ok(removed)
	}
}

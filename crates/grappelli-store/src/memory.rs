//! In-memory key-value store
//!
//! Process-local store with the same shape as the networked backends. Used
//! for tests and as the scratch store behind host-only deployments.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoreEntry {
	value: Vec<u8>,
	expires_at: Option<SystemTime>,
}

impl StoreEntry {
	fn new(value: Vec<u8>, ttl_secs: u32) -> Self {
		// TTL 0 follows the memcached convention: never expire
		let expires_at = if ttl_secs == 0 {
			None
		} else {
			Some(SystemTime::now() + Duration::from_secs(u64::from(ttl_secs)))
		};
		Self { value, expires_at }
	}

	fn is_expired(&self, now: SystemTime) -> bool {
		self.expires_at.is_some_and(|deadline| deadline <= now)
	}
}

/// Shared in-memory store keyed by string.
///
/// Cloning shares the underlying map, so handles passed to concurrent tasks
/// observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
	entries: Arc<RwLock<HashMap<String, StoreEntry>>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fetch a value; expired entries read as absent
	pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
		let entries = self.entries.read().await;
		let entry = entries.get(key)?;
		if entry.is_expired(SystemTime::now()) {
			return None;
		}
		Some(entry.value.clone())
	}

	/// Store a value, replacing any existing entry
	pub async fn set(&self, key: &str, value: &[u8], ttl_secs: u32) {
		let mut entries = self.entries.write().await;
		entries.insert(key.to_string(), StoreEntry::new(value.to_vec(), ttl_secs));
	}

	/// Store a value only when the key is absent; returns whether it landed
	pub async fn add(&self, key: &str, value: &[u8], ttl_secs: u32) -> bool {
		let mut entries = self.entries.write().await;
		let now = SystemTime::now();
		match entries.get(key) {
			Some(existing) if !existing.is_expired(now) => false,
			_ => {
				entries.insert(key.to_string(), StoreEntry::new(value.to_vec(), ttl_secs));
				true
			}
		}
	}

	/// Remove a key; returns whether it was present
	pub async fn delete(&self, key: &str) -> bool {
		let mut entries = self.entries.write().await;
		entries.remove(key).is_some()
	}

	/// List live keys starting with `prefix`
	pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
		let entries = self.entries.read().await;
		let now = SystemTime::now();
		entries
			.iter()
			.filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired(now))
			.map(|(key, _)| key.clone())
			.collect()
	}

	/// Drop every entry
	pub async fn clear(&self) {
		self.entries.write().await.clear();
	}

	/// Drop expired entries; returns how many were removed
	pub async fn cleanup_expired(&self) -> usize {
		let mut entries = self.entries.write().await;
		let now = SystemTime::now();
		let before = entries.len();
		entries.retain(|_, entry| !entry.is_expired(now));
		before - entries.len()
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.is_empty()
	}
}

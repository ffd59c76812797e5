//! Memcached store client with multi-server support.
//!
//! This module provides a byte-oriented Memcached client using the
//! `memcache-async` crate.
//!
//! # Features
//!
//! - **Multi-server support**: Connect to multiple Memcached servers for high availability
//! - **Automatic failover**: Retry get/set/delete on other servers if one fails
//! - **Consistent placement**: The same key always hashes to the same server
//! - **Async/await support**: Built on tokio
//! - **ASCII protocol**: Uses the Memcached ASCII protocol for compatibility
//!
//! Claim-style `add` operations never fail over: an atomic add is only
//! meaningful on the key's home server, where every competitor lands.

use crate::error::StoreError;
use memcache_async::ascii::Protocol;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

// Type alias for the memcached protocol with tokio TcpStream
type MemcachedProtocol = Protocol<Compat<TcpStream>>;

/// Memcached-backed key-value store.
///
/// Connections are established once per server and shared behind mutexes;
/// callers typically hold the store in an `Arc`.
pub struct MemcachedStore {
	servers: Vec<Mutex<MemcachedProtocol>>,
	addrs: Vec<String>,
}

impl MemcachedStore {
	/// Connect to the configured servers.
	///
	/// Unreachable servers are skipped with a warning; at least one server
	/// must be reachable for construction to succeed.
	pub async fn connect(servers: &[String]) -> Result<Self, StoreError> {
		if servers.is_empty() {
			return Err(StoreError::NotConfigured("memcached"));
		}

		let mut protocols = Vec::new();
		let mut addrs = Vec::new();
		let mut last_error = None;

		for server_addr in servers {
			match Self::connect_to_server(server_addr).await {
				Ok(protocol) => {
					protocols.push(Mutex::new(protocol));
					addrs.push(server_addr.clone());
				}
				Err(e) => {
					tracing::warn!(server = %server_addr, error = %e, "failed to connect to memcached server");
					last_error = Some(e);
				}
			}
		}

		if protocols.is_empty() {
			return Err(last_error.unwrap_or_else(|| {
				StoreError::Backend("failed to connect to any memcached server".to_string())
			}));
		}

		Ok(Self {
			servers: protocols,
			addrs,
		})
	}

	async fn connect_to_server(server_addr: &str) -> Result<MemcachedProtocol, StoreError> {
		// Use tokio TcpStream for native async support
		let stream = TcpStream::connect(server_addr)
			.await
			.map_err(|e| StoreError::Backend(format!("failed to connect to memcached: {}", e)))?;

		// Convert tokio TcpStream to a futures-compatible stream
		Ok(Protocol::new(stream.compat()))
	}

	/// Get a consistent server index for a given key using hashing.
	/// This ensures the same key always maps to the same server.
	fn server_index_for_key(&self, key: &str) -> usize {
		let mut hasher = DefaultHasher::new();
		key.hash(&mut hasher);
		(hasher.finish() as usize) % self.servers.len()
	}

	/// Fetch a value; missing keys and empty values read as absent
	pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
		let start_index = self.server_index_for_key(key);
		let server_count = self.servers.len();

		for attempt in 0..server_count {
			let index = (start_index + attempt) % server_count;
			let mut protocol = self.servers[index].lock().await;

			match protocol.get(&key).await {
				Ok(value) => {
					// Empty values are written by delete fallbacks; treat as absent
					if value.is_empty() {
						return Ok(None);
					}
					return Ok(Some(value));
				}
				Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
				Err(e) => {
					if attempt < server_count - 1 {
						tracing::warn!(server = %self.addrs[index], error = %e, "memcached get failed, trying next server");
					} else {
						return Err(StoreError::Backend(format!("memcached get error: {}", e)));
					}
				}
			}
		}

		Ok(None)
	}

	/// Store a value; TTL 0 means no expiry
	pub async fn set(&self, key: &str, value: &[u8], ttl_secs: u32) -> Result<(), StoreError> {
		let start_index = self.server_index_for_key(key);
		let server_count = self.servers.len();

		for attempt in 0..server_count {
			let index = (start_index + attempt) % server_count;
			let mut protocol = self.servers[index].lock().await;

			match protocol.set(&key, value, ttl_secs).await {
				Ok(_) => return Ok(()),
				Err(e) => {
					if attempt < server_count - 1 {
						tracing::warn!(server = %self.addrs[index], error = %e, "memcached set failed, trying next server");
					} else {
						return Err(StoreError::Backend(format!("memcached set error: {}", e)));
					}
				}
			}
		}

		Err(StoreError::Backend(
			"memcached set failed on all servers".to_string(),
		))
	}

	/// Store a value only when the key is absent; returns whether it landed.
	///
	/// Runs solely against the key's home server so that concurrent adds
	/// contend on one atomic operation.
	pub async fn add(&self, key: &str, value: &[u8], ttl_secs: u32) -> Result<bool, StoreError> {
		let index = self.server_index_for_key(key);
		let mut protocol = self.servers[index].lock().await;

		match protocol.add(&key, value, ttl_secs).await {
			Ok(_) => Ok(true),
			Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
			Err(e) => Err(StoreError::Backend(format!("memcached add error: {}", e))),
		}
	}

	/// Remove a key; returns whether a value was deleted
	pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
		let start_index = self.server_index_for_key(key);
		let server_count = self.servers.len();

		for attempt in 0..server_count {
			let index = (start_index + attempt) % server_count;
			let mut protocol = self.servers[index].lock().await;

			match protocol.delete(&key).await {
				Ok(_) => return Ok(true),
				// Absent here; the key may still live on a failover server
				Err(e) if e.kind() == ErrorKind::NotFound => continue,
				Err(e) => {
					if attempt < server_count - 1 {
						tracing::warn!(server = %self.addrs[index], error = %e, "memcached delete failed, trying next server");
					} else {
						return Err(StoreError::Backend(format!("memcached delete error: {}", e)));
					}
				}
			}
		}

		Ok(false)
	}

	/// Number of connected servers
	pub fn server_count(&self) -> usize {
		self.servers.len()
	}
}

impl std::fmt::Debug for MemcachedStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemcachedStore")
			.field("servers", &self.addrs)
			.finish()
	}
}

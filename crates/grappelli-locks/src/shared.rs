//! Shared-backend claim locks
//!
//! One claim key per lock name in a shared store, giving exclusion across
//! hosts. Acquisition busy-waits on an atomic add-if-absent operation with
//! the fixed retry interval; release deletes the key. A backend error
//! during the claim loop counts as contention and the loop keeps retrying,
//! so acquisition has no failure mode besides not returning yet.

use crate::backend::{HeldLock, LockBackend};
use crate::error::LockError;
use crate::RETRY_INTERVAL;
use async_trait::async_trait;
use std::sync::Arc;

const CLAIM_VALUE: &[u8] = b"1";

#[cfg(feature = "redis")]
#[derive(Debug)]
pub struct RedisClaims {
	store: Arc<grappelli_store::RedisStore>,
}

#[cfg(feature = "redis")]
impl RedisClaims {
	pub fn new(store: Arc<grappelli_store::RedisStore>) -> Self {
		Self { store }
	}

	fn claim_key(name: &str) -> String {
		format!("grappelli:locks:{}", name)
	}
}

#[cfg(feature = "redis")]
#[async_trait]
impl LockBackend for RedisClaims {
	async fn acquire(&self, name: &str) -> Result<HeldLock, LockError> {
		let key = Self::claim_key(name);
		loop {
			match self.store.set_if_absent(&key, CLAIM_VALUE).await {
				Ok(true) => return Ok(HeldLock::Claim { key }),
				Ok(false) => {}
				Err(e) => {
					tracing::trace!(name = %name, error = %e, "redis claim attempt failed, retrying")
				}
			}
			tokio::time::sleep(RETRY_INTERVAL).await;
		}
	}

	async fn release(&self, name: &str, held: HeldLock) -> bool {
		match held {
			HeldLock::Claim { key } => match self.store.delete(&key).await {
				Ok(deleted) => {
					if !deleted {
						tracing::warn!(name = %name, "lock claim was already gone at release");
					}
					deleted
				}
				Err(e) => {
					tracing::warn!(name = %name, error = %e, "redis claim release failed");
					false
				}
			},
			_ => false,
		}
	}

	fn kind(&self) -> &'static str {
		"redis"
	}
}

#[cfg(feature = "memcached")]
#[derive(Debug)]
pub struct MemcachedClaims {
	store: Arc<grappelli_store::MemcachedStore>,
}

#[cfg(feature = "memcached")]
impl MemcachedClaims {
	pub fn new(store: Arc<grappelli_store::MemcachedStore>) -> Self {
		Self { store }
	}

	/// Claim key for a name.
	///
	/// Memcached keys cannot carry spaces or control bytes, so the name is
	/// sanitized and suffixed with a stable hash to keep distinct names
	/// distinct across processes.
	fn claim_key(name: &str) -> String {
		use std::collections::hash_map::DefaultHasher;
		use std::hash::{Hash, Hasher};

		let mut hasher = DefaultHasher::new();
		name.hash(&mut hasher);
		let head: String = name
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
			.take(48)
			.collect();
		format!("grappelli.locks.{}.{:016x}", head, hasher.finish())
	}
}

#[cfg(feature = "memcached")]
#[async_trait]
impl LockBackend for MemcachedClaims {
	async fn acquire(&self, name: &str) -> Result<HeldLock, LockError> {
		let key = Self::claim_key(name);
		loop {
			match self.store.add(&key, CLAIM_VALUE, 0).await {
				Ok(true) => return Ok(HeldLock::Claim { key }),
				Ok(false) => {}
				Err(e) => {
					tracing::trace!(name = %name, error = %e, "memcached claim attempt failed, retrying")
				}
			}
			tokio::time::sleep(RETRY_INTERVAL).await;
		}
	}

	async fn release(&self, name: &str, held: HeldLock) -> bool {
		match held {
			HeldLock::Claim { key } => match self.store.delete(&key).await {
				Ok(deleted) => {
					if !deleted {
						tracing::warn!(name = %name, "lock claim was already gone at release");
					}
					deleted
				}
				Err(e) => {
					tracing::warn!(name = %name, error = %e, "memcached claim release failed");
					false
				}
			},
			_ => false,
		}
	}

	fn kind(&self) -> &'static str {
		"memcached"
	}
}

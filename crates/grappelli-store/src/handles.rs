//! Process-wide store handles
//!
//! Distributed backend connections are established once per process and then
//! shared. The first caller's server list wins; later callers receive the
//! cached handle regardless of the list they pass. A failed connection is not
//! cached, so the next caller retries.

use crate::error::StoreError;
#[cfg(feature = "memcached")]
use crate::memcached::MemcachedStore;
#[cfg(feature = "redis")]
use crate::redis_backend::RedisStore;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[cfg(feature = "memcached")]
static MEMCACHED: OnceCell<Arc<MemcachedStore>> = OnceCell::const_new();

#[cfg(feature = "redis")]
static REDIS: OnceCell<Arc<RedisStore>> = OnceCell::const_new();

/// Shared memcached handle for this process
#[cfg(feature = "memcached")]
pub async fn memcached_handle(servers: &[String]) -> Result<Arc<MemcachedStore>, StoreError> {
	MEMCACHED
		.get_or_try_init(|| async {
			let store = MemcachedStore::connect(servers).await?;
			Ok(Arc::new(store))
		})
		.await
		.map(Arc::clone)
}

/// Shared redis handle for this process
#[cfg(feature = "redis")]
pub async fn redis_handle(urls: &[String]) -> Result<Arc<RedisStore>, StoreError> {
	REDIS
		.get_or_try_init(|| async {
			let store = RedisStore::connect(urls).await?;
			Ok(Arc::new(store))
		})
		.await
		.map(Arc::clone)
}

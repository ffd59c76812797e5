//! # Grappelli Store
//!
//! Key-value store clients shared by the session and locking layers.
//!
//! Three backends with one byte-oriented shape: an in-memory store for tests
//! and host-local work, a multi-server memcached client with failover, and a
//! redis client on a managed connection. Distributed handles are resolved
//! once per process through [`handles`].
//!
//! ## Features
//!
//! - `memcached`: enables [`MemcachedStore`] (via `memcache-async`)
//! - `redis`: enables [`RedisStore`] (via `redis` with a connection manager)
//!
//! ## Quick Start
//!
//! ```rust
//! use grappelli_store::InMemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = InMemoryStore::new();
//! store.set("greeting", b"hello", 0).await;
//! assert_eq!(store.get("greeting").await, Some(b"hello".to_vec()));
//! # }
//! ```

pub mod error;
pub mod handles;
pub mod memory;

#[cfg(feature = "memcached")]
pub mod memcached;

#[cfg(feature = "redis")]
pub mod redis_backend;

// Re-export commonly used types at the crate root for convenience
pub use error::StoreError;
pub use memory::InMemoryStore;

#[cfg(feature = "memcached")]
pub use memcached::MemcachedStore;

#[cfg(feature = "redis")]
pub use redis_backend::RedisStore;

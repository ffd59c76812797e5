//! # Grappelli
//!
//! Distributed session state, named locks, and a polymorphic serialization
//! envelope for Rust services.
//!
//! Grappelli keeps per-client session data consistent across a fleet of
//! request-handling processes. Sessions live in pluggable storage (files,
//! memcached, redis), values travel as self-describing envelopes that can
//! rebuild custom types, and named locks provide host- or cluster-wide
//! critical sections over the same backends.
//!
//! ## Core Principles
//!
//! - **One write per request**: session values decode lazily on first
//!   access and flush back in a single write at finalize
//! - **Best-effort coordination**: lock and lifecycle failures surface as
//!   boolean signals the caller can act on, never as panics
//! - **Backend parity**: the same session and lock semantics hold across
//!   every storage backend
//! - **Async-First**: built on tokio and async/await from the ground up
//!
//! ## Feature Flags
//!
//! - `full` (default) - All distributed backends
//! - `redis` - Redis-backed session storage and cluster locks
//! - `memcached` - Memcached-backed session storage and cluster locks
//!
//! Without either backend feature, sessions persist to files and locks stay
//! host-scoped.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use grappelli::prelude::*;
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), grappelli::SessionError> {
//! let settings = Arc::new(Settings::default());
//! let engine = SessionEngine::from_settings(Arc::clone(&settings)).await?;
//!
//! // One request: open, mutate, finalize
//! let meta = RequestMeta::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
//! let mut session = engine.open(&meta).await?;
//! session.set_static("user", "ada");
//! session.set_flash("notice", "signed in");
//! session.finalize(true).await?;
//!
//! // A critical section shared by every process on this host
//! let mut lock = Semaphore::host("nightly-report", settings);
//! if lock.lock().await {
//!     // exclusive section
//!     lock.unlock().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod conf;
pub mod locks;
pub mod sessions;
pub mod store;

// Re-export settings from dedicated crate
pub use grappelli_conf::{
	Env, EnvError, LockPreference, LockSettings, SessionSettings, SessionStorage, Settings,
	SettingsError, StoreSettings,
};

// Re-export the value model and envelope codec
pub use grappelli_codec::{
	decode, encode, register_packable, Packable, SerializationError, SessionValue, Unpack,
};

// Re-export locks
pub use grappelli_locks::{HeldLock, LockBackend, LockError, LockScope, Semaphore, RETRY_INTERVAL};

// Re-export the session engine and per-request context
pub use grappelli_sessions::{
	Deadline, FileHandler, LifecycleState, MemoryHandler, RequestMeta, SessionContext,
	SessionEngine, SessionError, SessionHandler, SessionResult,
};

// Re-export storage primitives
pub use grappelli_store::{InMemoryStore, StoreError};

#[cfg(feature = "memcached")]
pub use grappelli_store::MemcachedStore;
#[cfg(feature = "redis")]
pub use grappelli_store::RedisStore;

// Re-export common external dependencies
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use tokio;

pub mod prelude {
	// Core types - always available
	pub use crate::{
		decode, encode, register_packable, LifecycleState, LockScope, Packable, RequestMeta,
		Semaphore, SessionContext, SessionEngine, SessionValue, Settings, Unpack,
	};

	// External
	pub use async_trait::async_trait;
	pub use serde::{Deserialize, Serialize};
}

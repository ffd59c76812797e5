//! # Grappelli Sessions
//!
//! Request-scoped session state over pluggable distributed storage.
//!
//! A [`SessionEngine`] resolves one storage handler per process from
//! settings. Each request opens a [`SessionContext`], reads and writes
//! session variables through it, and finalizes it once at the end; values
//! decode lazily on first access and flush back in a single write.
//!
//! ## Features
//!
//! - **Three variable classes**: static values persist until deleted, flash
//!   values last one additional request unless extended, constants never
//!   leave the process
//! - **Anti-fixation lifecycle**: id renewal with an optional grace window
//!   during which the old id stays readable, expiry deadlines, client
//!   address binding
//! - **Pluggable storage**: file-backed by default, memcached and redis
//!   behind feature flags, in-memory for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grappelli_conf::Settings;
//! use grappelli_sessions::{RequestMeta, SessionEngine};
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), grappelli_sessions::SessionError> {
//! let engine = SessionEngine::from_settings(Arc::new(Settings::default())).await?;
//!
//! let meta = RequestMeta::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
//! let mut session = engine.open(&meta).await?;
//! session.set_static("user", "ada");
//! session.set_flash("notice", "signed in");
//! session.finalize(true).await?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod record;

// Re-export commonly used types at the crate root for convenience
pub use context::{LifecycleState, SessionContext};
pub use engine::{RequestMeta, SessionEngine};
pub use error::{SessionError, SessionResult};
pub use handlers::{FileHandler, MemoryHandler, SessionHandler};
pub use record::Deadline;

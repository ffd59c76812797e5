//! Sessions module.
//!
//! This module provides access to the session engine, per-request contexts,
//! and the storage handler contract.
//!
//! # Examples
//!
//! ```rust,no_run
//! use grappelli::conf::Settings;
//! use grappelli::sessions::{RequestMeta, SessionEngine};
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), grappelli::sessions::SessionError> {
//! let engine = SessionEngine::from_settings(Arc::new(Settings::default())).await?;
//! let mut session = engine
//!     .open(&RequestMeta::new(IpAddr::V4(Ipv4Addr::LOCALHOST)))
//!     .await?;
//! session.set_static("theme", "dark");
//! session.finalize(true).await?;
//! # Ok(())
//! # }
//! ```

pub use grappelli_sessions::*;

//! Configuration module.
//!
//! This module provides access to environment-driven settings for session
//! lifecycle, storage backends, and lock backends.
//!
//! # Examples
//!
//! ```rust
//! use grappelli::conf::{SessionStorage, Settings};
//!
//! let settings = Settings::default()
//!     .with_lifetime(7200)
//!     .with_storage(SessionStorage::Default);
//! assert!(settings.validate().is_ok());
//! ```

pub use grappelli_conf::*;

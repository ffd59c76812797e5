//! Locking module.
//!
//! This module provides access to named blocking locks with host and
//! cluster scopes.
//!
//! # Examples
//!
//! ```rust,no_run
//! use grappelli::conf::Settings;
//! use grappelli::locks::Semaphore;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let mut lock = Semaphore::cluster("billing-run", Arc::new(Settings::default()));
//! if lock.lock().await {
//!     // exclusive across every host sharing a backend
//!     lock.unlock().await;
//! }
//! # }
//! ```

pub use grappelli_locks::*;

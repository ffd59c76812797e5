//! Storage module.
//!
//! This module provides access to the key-value store clients shared by the
//! session and lock layers.
//!
//! # Examples
//!
//! ```rust
//! use grappelli::store::InMemoryStore;
//!
//! # async fn example() {
//! let store = InMemoryStore::new();
//! store.set("greeting", b"hello", 0).await;
//! assert_eq!(store.get("greeting").await, Some(b"hello".to_vec()));
//! # }
//! ```

pub use grappelli_store::*;

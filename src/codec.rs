//! Serialization module.
//!
//! This module provides access to the session value model, the tagged
//! envelope codec, and the custom-type registry.
//!
//! # Examples
//!
//! ```rust
//! use grappelli::codec::{decode, encode, SessionValue};
//!
//! let value = SessionValue::from("hello");
//! let envelope = encode(&value).unwrap();
//! assert_eq!(decode(&envelope).unwrap(), value);
//! ```

pub use grappelli_codec::*;

//! # Grappelli Codec
//!
//! Polymorphic session value model and tagged envelope codec.
//!
//! Session variables hold [`SessionValue`]s: JSON scalars, nested lists and
//! maps, or custom application types. Values travel as string envelopes that
//! embed enough type information to rebuild custom types on the way back.
//!
//! ## Features
//!
//! - **Tagged envelopes**: custom types are flagged with a leading `f` byte
//!   and a `[kind, payload]` JSON pair
//! - **Recursive composites**: lists and maps nest envelopes to any depth
//! - **Compile-time registry**: `register_packable!` collects revivers with
//!   the `inventory` crate, no startup registration calls
//!
//! ## Quick Start
//!
//! ```rust
//! use grappelli_codec::{decode, encode, SessionValue};
//!
//! let value = SessionValue::List(vec![
//!     SessionValue::from("alpha"),
//!     SessionValue::from(2),
//! ]);
//! let envelope = encode(&value).unwrap();
//! assert_eq!(decode(&envelope).unwrap(), value);
//! ```

pub mod envelope;
pub mod error;
pub mod registry;
pub mod value;

// Re-exported for use by the register_packable! macro
pub use inventory;

// Re-export commonly used types at the crate root for convenience
pub use envelope::{decode, encode};
pub use error::SerializationError;
pub use registry::{packable_kind_count, registered_kinds, PackableKind, ReviveFn};
pub use value::{Packable, SessionValue, Unpack};

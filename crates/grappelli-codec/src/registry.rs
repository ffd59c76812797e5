//! Packable Type Registry
//!
//! This module provides automatic registration of custom session value types
//! using the `inventory` crate for compile-time type-safe collection.
//!
//! ## Architecture
//!
//! 1. Each `register_packable!` invocation generates an `inventory::submit!` call
//! 2. On first decode of a custom envelope, the submissions are collected into
//!    a tag-indexed map
//! 3. Decoding resolves the reviver for a tag through [`lookup`]
//!
//! ## Example
//!
//! ```ignore
//! use grappelli_codec::{register_packable, Packable, Unpack};
//!
//! struct CartItem { sku: String, quantity: u32 }
//! // ... impl Packable and Unpack for CartItem ...
//! register_packable!(CartItem);
//! ```

use crate::error::SerializationError;
use crate::value::{Packable, Unpack};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Reviver function type for registered packable types.
///
/// This is the signature stored in each [`PackableKind`] entry:
/// - `Ok(boxed)` is the reconstructed value behind the trait object
/// - `Err(error)` reports a payload the type rejected
pub type ReviveFn = fn(Value) -> Result<Box<dyn Packable>, SerializationError>;

/// Packable type registration entry.
///
/// This struct is used with `inventory::collect!` to gather all custom types
/// registered via `register_packable!` at compile time.
pub struct PackableKind {
	/// The wire tag for this type (e.g. "CartItem")
	pub kind: &'static str,
	/// The function that rebuilds a value from its payload
	pub revive: ReviveFn,
}

// Collect all PackableKind submissions from linked crates
inventory::collect!(PackableKind);

/// Generic reviver used by `register_packable!` to adapt a concrete
/// [`Unpack`] type to the [`ReviveFn`] signature.
pub fn revive_as<T: Unpack>(payload: Value) -> Result<Box<dyn Packable>, SerializationError> {
	Ok(Box::new(T::unpack(payload)?))
}

/// Register a type implementing [`Unpack`] with the decode registry.
///
/// ```ignore
/// register_packable!(CartItem);
/// ```
#[macro_export]
macro_rules! register_packable {
	($ty:ty) => {
		$crate::inventory::submit! {
			$crate::registry::PackableKind {
				kind: <$ty as $crate::Unpack>::KIND,
				revive: $crate::registry::revive_as::<$ty>,
			}
		}
	};
}

static KINDS: OnceLock<HashMap<&'static str, &'static PackableKind>> = OnceLock::new();

/// Resolve the registry entry for a wire tag.
///
/// The tag-indexed map is built once from the inventory on first use; later
/// lookups are plain hash lookups and never mutate shared state.
pub fn lookup(kind: &str) -> Option<&'static PackableKind> {
	KINDS
		.get_or_init(|| {
			inventory::iter::<PackableKind>
				.into_iter()
				.map(|entry| (entry.kind, entry))
				.collect()
		})
		.get(kind)
		.copied()
}

/// Get the number of registered packable kinds.
///
/// This is useful for debugging and testing to verify that all expected
/// types have been registered.
pub fn packable_kind_count() -> usize {
	inventory::iter::<PackableKind>.into_iter().count()
}

/// Get a list of all registered wire tags.
pub fn registered_kinds() -> Vec<&'static str> {
	inventory::iter::<PackableKind>
		.into_iter()
		.map(|entry| entry.kind)
		.collect()
}

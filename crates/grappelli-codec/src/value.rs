//! Session value model
//!
//! A [`SessionValue`] is the unit stored under a session variable name. It is
//! either a JSON scalar, a composite of nested session values, or a custom
//! application type carried behind the [`Packable`] trait. Composites nest to
//! any depth and may mix scalars with custom values freely.

use crate::error::SerializationError;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// A type that can travel inside a session value envelope.
///
/// Implementors describe themselves with a stable `kind` tag and pack their
/// state into a JSON payload. The payload is opaque to the codec; only the
/// matching [`Unpack`] implementation interprets it again.
pub trait Packable: Send + Sync + 'static {
	/// Stable tag identifying this type on the wire
	fn kind(&self) -> &'static str;

	/// Serialize the value into its JSON payload
	fn pack(&self) -> Result<Value, SerializationError>;

	/// Clone behind the trait object
	fn clone_packable(&self) -> Box<dyn Packable>;

	/// Downcasting support for [`SessionValue::as_custom`]
	fn as_any(&self) -> &dyn Any;
}

/// Reconstruction side of [`Packable`].
///
/// `KIND` must return the same tag as `Packable::kind` for the type, since
/// decoding resolves the reviver by tag. Registration happens through the
/// [`register_packable!`](crate::register_packable) macro.
pub trait Unpack: Packable + Sized {
	/// Stable tag identifying this type on the wire
	const KIND: &'static str;

	/// Rebuild the value from its JSON payload
	fn unpack(payload: Value) -> Result<Self, SerializationError>;
}

/// A single session variable value.
///
/// # Examples
///
/// ```rust
/// use grappelli_codec::SessionValue;
///
/// let count = SessionValue::from(3);
/// let items = SessionValue::List(vec![count.clone(), SessionValue::from("three")]);
/// assert_eq!(items.as_list().map(<[_]>::len), Some(2));
/// ```
pub enum SessionValue {
	/// JSON scalar: null, boolean, number, or string
	Scalar(Value),
	/// Ordered sequence of nested values
	List(Vec<SessionValue>),
	/// String-keyed mapping of nested values
	Map(BTreeMap<String, SessionValue>),
	/// Registered application type
	Custom(Box<dyn Packable>),
}

impl SessionValue {
	/// Wrap a custom type
	pub fn custom<T: Packable>(value: T) -> Self {
		Self::Custom(Box::new(value))
	}

	/// The JSON null scalar
	pub fn null() -> Self {
		Self::Scalar(Value::Null)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Scalar(Value::Null))
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Scalar(Value::String(s)) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Scalar(Value::Bool(b)) => Some(*b),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Scalar(Value::Number(n)) => n.as_i64(),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Scalar(Value::Number(n)) => n.as_f64(),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[SessionValue]> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&BTreeMap<String, SessionValue>> {
		match self {
			Self::Map(entries) => Some(entries),
			_ => None,
		}
	}

	/// Borrow a custom value as its concrete type
	pub fn as_custom<T: Packable>(&self) -> Option<&T> {
		match self {
			Self::Custom(packable) => packable.as_any().downcast_ref::<T>(),
			_ => None,
		}
	}
}

impl Clone for SessionValue {
	fn clone(&self) -> Self {
		match self {
			Self::Scalar(raw) => Self::Scalar(raw.clone()),
			Self::List(items) => Self::List(items.clone()),
			Self::Map(entries) => Self::Map(entries.clone()),
			Self::Custom(packable) => Self::Custom(packable.clone_packable()),
		}
	}
}

impl fmt::Debug for SessionValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Scalar(raw) => f.debug_tuple("Scalar").field(raw).finish(),
			Self::List(items) => f.debug_tuple("List").field(items).finish(),
			Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
			Self::Custom(packable) => f
				.debug_struct("Custom")
				.field("kind", &packable.kind())
				.finish(),
		}
	}
}

impl PartialEq for SessionValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Scalar(a), Self::Scalar(b)) => a == b,
			(Self::List(a), Self::List(b)) => a == b,
			(Self::Map(a), Self::Map(b)) => a == b,
			// Custom values compare by wire identity: same kind, same payload
			(Self::Custom(a), Self::Custom(b)) => {
				a.kind() == b.kind()
					&& matches!((a.pack(), b.pack()), (Ok(x), Ok(y)) if x == y)
			}
			_ => false,
		}
	}
}

impl From<Value> for SessionValue {
	/// Normalize raw JSON into the structured value model.
	///
	/// Arrays and objects become [`SessionValue::List`] and
	/// [`SessionValue::Map`] so that the codec only ever sees scalars inside
	/// the `Scalar` variant.
	fn from(value: Value) -> Self {
		match value {
			Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
			Value::Object(entries) => Self::Map(
				entries
					.into_iter()
					.map(|(key, item)| (key, Self::from(item)))
					.collect(),
			),
			scalar => Self::Scalar(scalar),
		}
	}
}

impl From<bool> for SessionValue {
	fn from(value: bool) -> Self {
		Self::Scalar(Value::Bool(value))
	}
}

impl From<i64> for SessionValue {
	fn from(value: i64) -> Self {
		Self::Scalar(Value::from(value))
	}
}

impl From<i32> for SessionValue {
	fn from(value: i32) -> Self {
		Self::Scalar(Value::from(value))
	}
}

impl From<u32> for SessionValue {
	fn from(value: u32) -> Self {
		Self::Scalar(Value::from(value))
	}
}

impl From<f64> for SessionValue {
	fn from(value: f64) -> Self {
		Self::Scalar(Value::from(value))
	}
}

impl From<&str> for SessionValue {
	fn from(value: &str) -> Self {
		Self::Scalar(Value::String(value.to_string()))
	}
}

impl From<String> for SessionValue {
	fn from(value: String) -> Self {
		Self::Scalar(Value::String(value))
	}
}

impl From<Vec<SessionValue>> for SessionValue {
	fn from(items: Vec<SessionValue>) -> Self {
		Self::List(items)
	}
}

impl From<BTreeMap<String, SessionValue>> for SessionValue {
	fn from(entries: BTreeMap<String, SessionValue>) -> Self {
		Self::Map(entries)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn from_json_normalizes_composites() {
		let value = SessionValue::from(json!({"tags": ["a", "b"], "count": 2}));
		let map = value.as_map().unwrap();
		assert_eq!(map["count"].as_i64(), Some(2));
		let tags = map["tags"].as_list().unwrap();
		assert_eq!(tags[0].as_str(), Some("a"));
	}

	#[test]
	fn scalar_accessors_reject_other_shapes() {
		let value = SessionValue::from("text");
		assert_eq!(value.as_str(), Some("text"));
		assert_eq!(value.as_i64(), None);
		assert!(value.as_list().is_none());
	}

	#[test]
	fn null_is_a_value_not_an_absence() {
		let value = SessionValue::null();
		assert!(value.is_null());
		assert_eq!(value, SessionValue::Scalar(Value::Null));
	}

	#[test]
	fn equality_is_structural() {
		let a = SessionValue::List(vec![SessionValue::from(1), SessionValue::from("x")]);
		let b = SessionValue::List(vec![SessionValue::from(1), SessionValue::from("x")]);
		let c = SessionValue::List(vec![SessionValue::from(2), SessionValue::from("x")]);
		assert_eq!(a, b);
		assert_ne!(a, c);
	}
}

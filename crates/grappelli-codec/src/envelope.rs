//! Tagged envelope encoding
//!
//! Every stored session value is a string envelope. Scalars are plain JSON.
//! Custom types are flagged with a leading `f` byte followed by a JSON
//! `[kind, payload]` pair. Composites serialize as JSON arrays and objects
//! whose members are themselves envelope strings, so nesting survives any
//! depth and any mix of scalars and custom values.
//!
//! Decoding is deterministic: the first byte decides the path, and a custom
//! envelope always continues with `[`, which no JSON scalar can follow an
//! `f` with.

use crate::error::SerializationError;
use crate::registry;
use crate::value::SessionValue;
use serde_json::Value;
use std::collections::BTreeMap;

/// Leading byte of a custom envelope
const CUSTOM_TAG: u8 = b'f';

/// Encode a session value into its string envelope.
///
/// Encoding is a pure transform: it touches no storage and never consults
/// the type registry.
///
/// # Examples
///
/// ```rust
/// use grappelli_codec::{encode, SessionValue};
///
/// assert_eq!(encode(&SessionValue::from(42)).unwrap(), "42");
/// assert_eq!(encode(&SessionValue::from("hi")).unwrap(), "\"hi\"");
/// ```
pub fn encode(value: &SessionValue) -> Result<String, SerializationError> {
	match value {
		SessionValue::Scalar(raw) => match raw {
			// Composite JSON smuggled into the scalar variant still encodes
			// as nested envelopes
			Value::Array(_) | Value::Object(_) => encode(&SessionValue::from(raw.clone())),
			_ => Ok(serde_json::to_string(raw)?),
		},
		SessionValue::List(items) => {
			let envelopes = items.iter().map(encode).collect::<Result<Vec<_>, _>>()?;
			Ok(serde_json::to_string(&envelopes)?)
		}
		SessionValue::Map(entries) => {
			let mut envelopes = BTreeMap::new();
			for (key, item) in entries {
				envelopes.insert(key.as_str(), encode(item)?);
			}
			Ok(serde_json::to_string(&envelopes)?)
		}
		SessionValue::Custom(packable) => {
			let payload = packable.pack()?;
			let pair = serde_json::to_string(&(packable.kind(), payload))?;
			Ok(format!("{}{}", CUSTOM_TAG as char, pair))
		}
	}
}

/// Decode a string envelope back into a session value.
///
/// Custom envelopes resolve their reviver through the registry built by
/// [`register_packable!`](crate::register_packable). The empty string is
/// rejected rather than treated as null.
pub fn decode(envelope: &str) -> Result<SessionValue, SerializationError> {
	let bytes = envelope.as_bytes();
	match bytes {
		[] => Err(SerializationError::Empty),
		[CUSTOM_TAG, b'[', ..] => decode_custom(&envelope[1..]),
		_ => decode_plain(envelope),
	}
}

fn decode_plain(envelope: &str) -> Result<SessionValue, SerializationError> {
	let parsed: Value = serde_json::from_str(envelope)
		.map_err(|e| SerializationError::Malformed(format!("envelope is not valid JSON: {}", e)))?;
	match parsed {
		Value::Array(items) => {
			let mut decoded = Vec::with_capacity(items.len());
			for item in items {
				decoded.push(decode(nested_envelope(&item)?)?);
			}
			Ok(SessionValue::List(decoded))
		}
		Value::Object(entries) => {
			let mut decoded = BTreeMap::new();
			for (key, item) in entries {
				let value = decode(nested_envelope(&item)?)?;
				decoded.insert(key, value);
			}
			Ok(SessionValue::Map(decoded))
		}
		scalar => Ok(SessionValue::Scalar(scalar)),
	}
}

/// Composite members must be strings holding nested envelopes.
fn nested_envelope(item: &Value) -> Result<&str, SerializationError> {
	item.as_str().ok_or_else(|| {
		SerializationError::Malformed(format!(
			"composite member must be a nested envelope string, found {}",
			item
		))
	})
}

fn decode_custom(pair: &str) -> Result<SessionValue, SerializationError> {
	let (kind, payload): (String, Value) = serde_json::from_str(pair).map_err(|e| {
		SerializationError::Malformed(format!("custom envelope is not a [kind, payload] pair: {}", e))
	})?;
	let entry =
		registry::lookup(&kind).ok_or_else(|| SerializationError::UnknownKind(kind.clone()))?;
	let value = (entry.revive)(payload)?;
	Ok(SessionValue::Custom(value))
}

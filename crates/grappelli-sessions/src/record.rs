//! Persisted record layout
//!
//! A session row is a JSON object mapping storage keys to value envelopes.
//! Static variable `name` persists under `fim<name>` and flash under
//! `Fim<name>`; the prefixes are case-sensitive, so the two classes can
//! never collide. Two reserved control keys share the namespace: the
//! invalidation deadline and the bound client address.

use crate::error::SessionResult;
use grappelli_codec::SerializationError;
use std::collections::BTreeMap;

pub(crate) const STATIC_PREFIX: &str = "fim";
pub(crate) const FLASH_PREFIX: &str = "Fim";
pub(crate) const DEADLINE_KEY: &str = "FIMINVALIDATE";
pub(crate) const CLIENT_KEY: &str = "FIMIP";

/// Storage keys to value envelopes, as persisted through a handler
pub(crate) type Record = BTreeMap<String, String>;

pub(crate) fn static_key(name: &str) -> String {
	format!("{}{}", STATIC_PREFIX, name)
}

pub(crate) fn flash_key(name: &str) -> String {
	format!("{}{}", FLASH_PREFIX, name)
}

pub(crate) fn is_static_key(key: &str) -> bool {
	key.starts_with(STATIC_PREFIX)
}

pub(crate) fn is_flash_key(key: &str) -> bool {
	key.starts_with(FLASH_PREFIX)
}

/// Variable name carried by a prefixed storage key
pub(crate) fn key_name(key: &str) -> &str {
	&key[STATIC_PREFIX.len()..]
}

/// Session invalidation deadline.
///
/// Persists as one signed integer: positive is the absolute expiry after
/// which the session id must be renewed in place, negative is the absolute
/// end of a transition grace window after which the row is destroyed, and
/// an absent value means the session never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
	/// No expiry recorded
	Unset,
	/// Renew the id in place once this moment passes
	ExpiresAt(i64),
	/// Old id kept readable until this moment, then the row is destroyed
	TransitioningUntil(i64),
}

impl Deadline {
	/// Decode the signed persisted form
	pub fn from_raw(raw: i64) -> Self {
		match raw {
			0 => Self::Unset,
			t if t > 0 => Self::ExpiresAt(t),
			t => Self::TransitioningUntil(-t),
		}
	}

	/// Encode back into the signed persisted form; `Unset` is not persisted
	pub fn to_raw(self) -> Option<i64> {
		match self {
			Self::Unset => None,
			Self::ExpiresAt(t) => Some(t),
			Self::TransitioningUntil(t) => Some(-t),
		}
	}
}

pub(crate) fn parse_record(payload: &[u8]) -> Option<Record> {
	serde_json::from_slice(payload).ok()
}

pub(crate) fn serialize_record(record: &Record) -> SessionResult<Vec<u8>> {
	Ok(serde_json::to_vec(record).map_err(SerializationError::from)?)
}

pub(crate) fn parse_deadline(envelope: &str) -> Option<i64> {
	serde_json::from_str(envelope).ok()
}

pub(crate) fn deadline_envelope(raw: i64) -> String {
	raw.to_string()
}

pub(crate) fn parse_client(envelope: &str) -> Option<String> {
	serde_json::from_str(envelope).ok()
}

pub(crate) fn client_envelope(addr: &str) -> String {
	serde_json::Value::String(addr.to_string()).to_string()
}

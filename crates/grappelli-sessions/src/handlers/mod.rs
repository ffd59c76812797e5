//! Storage handlers
//!
//! A handler moves opaque session payloads in and out of one backing
//! store. Every stored value is stamped with a big-endian seconds
//! timestamp so garbage collection can age rows without understanding
//! their contents.

use crate::error::SessionResult;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::time::Duration;

mod file;
mod memory;

#[cfg(feature = "memcached")]
mod memcached;
#[cfg(feature = "redis")]
mod redis;

pub use file::FileHandler;
pub use memory::MemoryHandler;

#[cfg(feature = "memcached")]
pub use memcached::MemcachedHandler;
#[cfg(feature = "redis")]
pub use redis::RedisHandler;

/// Width of the write-time stamp prefixed to every stored payload
const STAMP_LEN: usize = 4;

/// Session storage backend.
///
/// Implementations persist payloads keyed by session id. `read` returns
/// the payload as last written, `destroy` reports whether a row existed,
/// and `gc` removes rows whose last write is older than `max_age`.
#[async_trait]
pub trait SessionHandler: Send + Sync + fmt::Debug {
	/// Prepare the handler for a request
	async fn open(&self) -> SessionResult<()>;

	/// Release per-request resources
	async fn close(&self) -> SessionResult<()>;

	/// Fetch the payload stored under `id`, if any
	async fn read(&self, id: &str) -> SessionResult<Option<Vec<u8>>>;

	/// Store `payload` under `id`, replacing any previous value
	async fn write(&self, id: &str, payload: &[u8]) -> SessionResult<()>;

	/// Remove the row stored under `id`; `Ok(true)` when one existed
	async fn destroy(&self, id: &str) -> SessionResult<bool>;

	/// Drop rows last written more than `max_age` ago, returning the count
	async fn gc(&self, max_age: Duration) -> SessionResult<usize>;
}

/// Prefix `payload` with the current time as a big-endian seconds stamp
fn stamp(payload: &[u8]) -> Vec<u8> {
	let now = Utc::now().timestamp() as u32;
	let mut stored = Vec::with_capacity(STAMP_LEN + payload.len());
	stored.extend_from_slice(&now.to_be_bytes());
	stored.extend_from_slice(payload);
	stored
}

/// Split a stored value back into its stamp and payload.
///
/// Values too short to carry a stamp are treated as absent rather than
/// surfaced as errors; they can only appear through outside interference
/// with the store.
fn split_stamped(stored: &[u8]) -> Option<(u32, &[u8])> {
	if stored.len() < STAMP_LEN {
		return None;
	}
	let (head, payload) = stored.split_at(STAMP_LEN);
	let mut raw = [0u8; STAMP_LEN];
	raw.copy_from_slice(head);
	Some((u32::from_be_bytes(raw), payload))
}

/// Oldest acceptable write stamp for the given age limit
fn gc_cutoff(max_age: Duration) -> u32 {
	let now = Utc::now().timestamp() as u32;
	now.saturating_sub(max_age.as_secs().min(u32::MAX as u64) as u32)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stamp_prepends_four_big_endian_bytes() {
		let stored = stamp(b"payload");
		assert_eq!(stored.len(), 4 + b"payload".len());

		let (ts, payload) = split_stamped(&stored).unwrap();
		assert_eq!(payload, b"payload");

		let now = Utc::now().timestamp() as u32;
		assert!(now - ts <= 1, "stamp should be the write time");
	}

	#[test]
	fn stamp_survives_empty_payloads() {
		let stored = stamp(b"");
		let (_, payload) = split_stamped(&stored).unwrap();
		assert!(payload.is_empty());
	}

	#[test]
	fn short_values_split_to_nothing() {
		assert!(split_stamped(b"").is_none());
		assert!(split_stamped(b"abc").is_none());
	}

	#[test]
	fn wire_layout_is_big_endian() {
		let mut stored = 0x0102_0304u32.to_be_bytes().to_vec();
		stored.extend_from_slice(b"x");
		let (ts, payload) = split_stamped(&stored).unwrap();
		assert_eq!(ts, 0x0102_0304);
		assert_eq!(payload, b"x");
	}

	#[test]
	fn cutoff_saturates_at_the_epoch() {
		assert_eq!(gc_cutoff(Duration::from_secs(u64::MAX)), 0);
		let now = Utc::now().timestamp() as u32;
		assert!(gc_cutoff(Duration::from_secs(60)) >= now - 61);
	}
}

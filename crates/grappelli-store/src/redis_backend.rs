//! Redis store client
//!
//! Byte-oriented Redis client built on a shared [`ConnectionManager`], which
//! multiplexes one connection and reconnects on failure. Exposes plain keys
//! for claim-style operations and hash fields for record collections.

use crate::error::StoreError;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;

/// Redis-backed key-value store.
///
/// Cloning shares the underlying managed connection.
#[derive(Clone)]
pub struct RedisStore {
	connection: Arc<ConnectionManager>,
}

impl RedisStore {
	/// Connect using the first configured URL.
	pub async fn connect(urls: &[String]) -> Result<Self, StoreError> {
		let url = urls.first().ok_or(StoreError::NotConfigured("redis"))?;

		let client = redis::Client::open(url.as_str())
			.map_err(|e| StoreError::Backend(format!("invalid redis URL: {}", e)))?;
		let manager = ConnectionManager::new(client)
			.await
			.map_err(|e| StoreError::Backend(format!("failed to connect to redis: {}", e)))?;

		Ok(Self {
			connection: Arc::new(manager),
		})
	}

	fn connection(&self) -> ConnectionManager {
		(*self.connection).clone()
	}

	/// Fetch a plain key
	pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
		let mut conn = self.connection();
		let value: Option<Vec<u8>> = conn
			.get(key)
			.await
			.map_err(|e| StoreError::Backend(format!("redis get error: {}", e)))?;
		Ok(value)
	}

	/// Store a plain key; TTL 0 means no expiry
	pub async fn set(&self, key: &str, value: &[u8], ttl_secs: u32) -> Result<(), StoreError> {
		let mut conn = self.connection();
		if ttl_secs > 0 {
			let _: () = conn
				.set_ex(key, value, u64::from(ttl_secs))
				.await
				.map_err(|e| StoreError::Backend(format!("redis set error: {}", e)))?;
		} else {
			let _: () = conn
				.set(key, value)
				.await
				.map_err(|e| StoreError::Backend(format!("redis set error: {}", e)))?;
		}
		Ok(())
	}

	/// Store a plain key only when absent; returns whether it landed
	pub async fn set_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
		let mut conn = self.connection();
		let landed: bool = conn
			.set_nx(key, value)
			.await
			.map_err(|e| StoreError::Backend(format!("redis set_nx error: {}", e)))?;
		Ok(landed)
	}

	/// Remove a plain key; returns whether a value was deleted
	pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
		let mut conn = self.connection();
		let removed: i64 = conn
			.del(key)
			.await
			.map_err(|e| StoreError::Backend(format!("redis del error: {}", e)))?;
		Ok(removed > 0)
	}

	/// Fetch one field of a hash
	pub async fn hash_get(&self, hash: &str, field: &str) -> Result<Option<Vec<u8>>, StoreError> {
		let mut conn = self.connection();
		let value: Option<Vec<u8>> = conn
			.hget(hash, field)
			.await
			.map_err(|e| StoreError::Backend(format!("redis hget error: {}", e)))?;
		Ok(value)
	}

	/// Store one field of a hash
	pub async fn hash_set(&self, hash: &str, field: &str, value: &[u8]) -> Result<(), StoreError> {
		let mut conn = self.connection();
		let _: () = conn
			.hset(hash, field, value)
			.await
			.map_err(|e| StoreError::Backend(format!("redis hset error: {}", e)))?;
		Ok(())
	}

	/// Remove one field of a hash; returns whether the field existed
	pub async fn hash_delete(&self, hash: &str, field: &str) -> Result<bool, StoreError> {
		let mut conn = self.connection();
		let removed: i64 = conn
			.hdel(hash, field)
			.await
			.map_err(|e| StoreError::Backend(format!("redis hdel error: {}", e)))?;
		Ok(removed > 0)
	}

	/// List the field names of a hash
	pub async fn hash_fields(&self, hash: &str) -> Result<Vec<String>, StoreError> {
		let mut conn = self.connection();
		let fields: Vec<String> = conn
			.hkeys(hash)
			.await
			.map_err(|e| StoreError::Backend(format!("redis hkeys error: {}", e)))?;
		Ok(fields)
	}
}

impl std::fmt::Debug for RedisStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedisStore").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn connect_requires_configured_servers() {
		let result = RedisStore::connect(&[]).await;
		assert!(matches!(result, Err(StoreError::NotConfigured("redis"))));
	}

	#[tokio::test]
	#[ignore] // Requires running redis server on localhost:6379
	async fn round_trip_against_live_server() {
		let urls = vec!["redis://127.0.0.1/".to_string()];
		let store = RedisStore::connect(&urls).await.unwrap();

		store.set("grappelli-test", b"payload", 60).await.unwrap();
		assert_eq!(
			store.get("grappelli-test").await.unwrap(),
			Some(b"payload".to_vec())
		);

		assert!(store.delete("grappelli-test").await.unwrap());
		assert!(!store.delete("grappelli-test").await.unwrap());
	}

	#[tokio::test]
	#[ignore] // Requires running redis server on localhost:6379
	async fn hash_fields_round_trip() {
		let urls = vec!["redis://127.0.0.1/".to_string()];
		let store = RedisStore::connect(&urls).await.unwrap();

		store.hash_set("grappelli-hash", "a", b"1").await.unwrap();
		store.hash_set("grappelli-hash", "b", b"2").await.unwrap();

		let mut fields = store.hash_fields("grappelli-hash").await.unwrap();
		fields.sort();
		assert_eq!(fields, vec!["a", "b"]);

		assert_eq!(
			store.hash_get("grappelli-hash", "a").await.unwrap(),
			Some(b"1".to_vec())
		);
		assert!(store.hash_delete("grappelli-hash", "a").await.unwrap());
		assert_eq!(store.hash_get("grappelli-hash", "a").await.unwrap(), None);
		store.hash_delete("grappelli-hash", "b").await.unwrap();
	}

	#[tokio::test]
	#[ignore] // Requires running redis server on localhost:6379
	async fn set_if_absent_is_first_writer_wins() {
		let urls = vec!["redis://127.0.0.1/".to_string()];
		let store = RedisStore::connect(&urls).await.unwrap();

		store.delete("grappelli-claim").await.unwrap();
		assert!(store.set_if_absent("grappelli-claim", b"1").await.unwrap());
		assert!(!store.set_if_absent("grappelli-claim", b"2").await.unwrap());
		store.delete("grappelli-claim").await.unwrap();
	}
}

//! Session engine
//!
//! The engine resolves the storage handler once from settings and opens one
//! [`SessionContext`] per request: it loads the persisted record, applies
//! the lifecycle entry checks, and hands the context to the request. The
//! matching end-of-request call is [`SessionContext::finalize`].

use crate::context::SessionContext;
use crate::error::{SessionError, SessionResult};
use crate::handlers::{FileHandler, SessionHandler};
use crate::record::{self, Record};
use grappelli_conf::{SessionStorage, Settings};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// What the transport layer knows about a request before the session opens
#[derive(Debug, Clone)]
pub struct RequestMeta {
	session_id: Option<String>,
	client_addr: IpAddr,
}

impl RequestMeta {
	pub fn new(client_addr: IpAddr) -> Self {
		Self {
			session_id: None,
			client_addr,
		}
	}

	/// Attach the session id presented by the client, typically from the
	/// session cookie
	pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
		self.session_id = Some(id.into());
		self
	}

	pub fn session_id(&self) -> Option<&str> {
		self.session_id.as_deref()
	}

	pub fn client_addr(&self) -> IpAddr {
		self.client_addr
	}
}

#[derive(Debug, Clone)]
pub struct SessionEngine {
	settings: Arc<Settings>,
	handler: Arc<dyn SessionHandler>,
}

impl SessionEngine {
	/// Resolve the storage handler named by the settings.
	///
	/// Fails with [`SessionError::StorageUnavailable`] when the selected
	/// storage has no servers configured or is not compiled in.
	pub async fn from_settings(settings: Arc<Settings>) -> SessionResult<Self> {
		let handler: Arc<dyn SessionHandler> = match settings.session.storage {
			SessionStorage::Default => {
				Arc::new(FileHandler::new(settings.session.file_dir.clone()))
			}
			SessionStorage::Memcached => Self::memcached_handler(&settings).await?,
			SessionStorage::Redis => Self::redis_handler(&settings).await?,
		};
		tracing::debug!(storage = ?settings.session.storage, "resolved session storage handler");
		Ok(Self { settings, handler })
	}

	/// Build an engine around an explicit handler, bypassing resolution
	pub fn with_handler(settings: Arc<Settings>, handler: Arc<dyn SessionHandler>) -> Self {
		Self { settings, handler }
	}

	#[cfg(feature = "memcached")]
	async fn memcached_handler(settings: &Arc<Settings>) -> SessionResult<Arc<dyn SessionHandler>> {
		use crate::handlers::MemcachedHandler;

		if !settings.stores.has_memcached() {
			return Err(SessionError::StorageUnavailable(
				"memcached storage selected but no servers configured".to_string(),
			));
		}
		let store = grappelli_store::handles::memcached_handle(&settings.stores.memcached_servers)
			.await?;
		Ok(Arc::new(MemcachedHandler::new(store, Arc::clone(settings))))
	}

	#[cfg(not(feature = "memcached"))]
	async fn memcached_handler(_settings: &Arc<Settings>) -> SessionResult<Arc<dyn SessionHandler>> {
		Err(SessionError::StorageUnavailable(
			"memcached storage selected but support is not compiled in".to_string(),
		))
	}

	#[cfg(feature = "redis")]
	async fn redis_handler(settings: &Arc<Settings>) -> SessionResult<Arc<dyn SessionHandler>> {
		use crate::handlers::RedisHandler;

		if !settings.stores.has_redis() {
			return Err(SessionError::StorageUnavailable(
				"redis storage selected but no servers configured".to_string(),
			));
		}
		let store = grappelli_store::handles::redis_handle(&settings.stores.redis_servers).await?;
		Ok(Arc::new(RedisHandler::new(store)))
	}

	#[cfg(not(feature = "redis"))]
	async fn redis_handler(_settings: &Arc<Settings>) -> SessionResult<Arc<dyn SessionHandler>> {
		Err(SessionError::StorageUnavailable(
			"redis storage selected but support is not compiled in".to_string(),
		))
	}

	/// Cookie name the transport layer should use for the session id
	pub fn cookie_name(&self) -> &str {
		&self.settings.session.cookie_name
	}

	/// Open the session for one request.
	///
	/// Unknown and unreadable ids start a fresh session rather than
	/// failing the request; lifecycle entry checks run before the context
	/// is returned.
	pub async fn open(&self, meta: &RequestMeta) -> SessionResult<SessionContext> {
		self.handler.open().await?;

		let (id, record, was_fresh) = match meta.session_id() {
			Some(id) => match self.handler.read(id).await? {
				Some(payload) => match record::parse_record(&payload) {
					Some(parsed) => (id.to_string(), parsed, false),
					None => {
						tracing::warn!(session = %id, "unreadable session row; starting fresh");
						self.handler.destroy(id).await?;
						(id.to_string(), Record::new(), true)
					}
				},
				None => (id.to_string(), Record::new(), true),
			},
			None => (Uuid::new_v4().to_string(), Record::new(), true),
		};

		let mut context = SessionContext::from_record(
			id,
			Arc::clone(&self.handler),
			Arc::clone(&self.settings),
			record,
			was_fresh,
		);
		context
			.apply_entry_checks(&meta.client_addr().to_string())
			.await?;
		Ok(context)
	}

	/// Remove sessions whose last write is older than `max_age`
	pub async fn gc(&self, max_age: Duration) -> SessionResult<usize> {
		let removed = self.handler.gc(max_age).await?;
		if removed > 0 {
			tracing::debug!(removed, "session gc sweep finished");
		}
		Ok(removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::LifecycleState;
	use crate::handlers::MemoryHandler;
	use std::net::Ipv4Addr;

	fn meta() -> RequestMeta {
		RequestMeta::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)))
	}

	fn memory_engine() -> SessionEngine {
		SessionEngine::with_handler(
			Arc::new(Settings::default()),
			Arc::new(MemoryHandler::new()),
		)
	}

	#[tokio::test]
	async fn default_storage_resolves_to_the_file_handler() {
		let engine = SessionEngine::from_settings(Arc::new(Settings::default()))
			.await
			.unwrap();
		assert!(format!("{:?}", engine).contains("FileHandler"));
		assert_eq!(engine.cookie_name(), "sessionid");
	}

	#[tokio::test]
	async fn unconfigured_distributed_storage_is_rejected() {
		let memcached = Settings::default().with_storage(SessionStorage::Memcached);
		let result = SessionEngine::from_settings(Arc::new(memcached)).await;
		assert!(matches!(result, Err(SessionError::StorageUnavailable(_))));

		let redis = Settings::default().with_storage(SessionStorage::Redis);
		let result = SessionEngine::from_settings(Arc::new(redis)).await;
		assert!(matches!(result, Err(SessionError::StorageUnavailable(_))));
	}

	#[tokio::test]
	async fn requests_without_an_id_open_fresh_sessions() {
		let engine = memory_engine();
		let ctx = engine.open(&meta()).await.unwrap();
		assert_eq!(ctx.state(), LifecycleState::Fresh);
		assert!(!ctx.id().is_empty());
		assert_eq!(ctx.client(), Some("203.0.113.9"));
	}

	#[tokio::test]
	async fn unknown_supplied_ids_open_fresh_sessions() {
		let engine = memory_engine();
		let ctx = engine
			.open(&meta().with_session_id("never-seen"))
			.await
			.unwrap();
		assert_eq!(ctx.state(), LifecycleState::Fresh);
		assert_eq!(ctx.id(), "never-seen");
	}

	#[tokio::test]
	async fn sessions_persist_across_requests() {
		let engine = memory_engine();

		let mut first = engine.open(&meta()).await.unwrap();
		first.set_static("name", "ada");
		let id = first.id().to_string();
		first.finalize(true).await.unwrap();

		let mut second = engine.open(&meta().with_session_id(id)).await.unwrap();
		assert_eq!(second.state(), LifecycleState::Active);
		assert_eq!(
			second.get_static("name").unwrap().and_then(|v| v.as_str()),
			Some("ada")
		);
	}

	#[tokio::test]
	async fn unreadable_rows_are_destroyed_and_replaced() {
		let handler = Arc::new(MemoryHandler::new());
		handler.write("mangled", b"not a record").await.unwrap();
		let engine = SessionEngine::with_handler(Arc::new(Settings::default()), handler.clone());

		let ctx = engine
			.open(&meta().with_session_id("mangled"))
			.await
			.unwrap();
		assert_eq!(ctx.state(), LifecycleState::Fresh);
		assert_eq!(handler.read("mangled").await.unwrap(), None);
	}

	#[tokio::test]
	async fn gc_delegates_to_the_handler() {
		let engine = memory_engine();
		assert_eq!(engine.gc(Duration::from_secs(60)).await.unwrap(), 0);
	}
}

//! Lock backend capability interface and per-scope resolution
//!
//! Each backend implements one small interface: a blocking `acquire` and a
//! boolean `release`. Which backend serves a scope is decided once per
//! process on first use and cached, including a failed cluster probe.

use crate::error::LockError;
use crate::file::FileLocks;
use crate::local::LocalSemaphores;
use crate::LockScope;
use async_trait::async_trait;
use grappelli_conf::{LockPreference, Settings};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resource held while a lock is acquired.
///
/// Dropping the `Local` and `File` variants releases the underlying
/// resource on its own; claim keys need an explicit backend delete.
#[derive(Debug)]
pub enum HeldLock {
	/// Guard over the in-process semaphore table entry
	Local(tokio::sync::OwnedMutexGuard<()>),
	/// Open file descriptor holding an advisory exclusive lock
	File(std::fs::File),
	/// Claim key stored in a shared backend
	Claim { key: String },
}

/// Capability interface implemented by every lock backend variant
#[async_trait]
pub trait LockBackend: Send + Sync + fmt::Debug {
	/// Block until the named lock is held
	async fn acquire(&self, name: &str) -> Result<HeldLock, LockError>;

	/// Release a held lock; `false` when the resource was already gone
	async fn release(&self, name: &str, held: HeldLock) -> bool;

	/// Short identifier for diagnostics
	fn kind(&self) -> &'static str;
}

static HOST_BACKEND: OnceCell<Arc<dyn LockBackend>> = OnceCell::const_new();
static CLUSTER_BACKEND: OnceCell<Option<Arc<dyn LockBackend>>> = OnceCell::const_new();

/// Resolve the backend serving a scope, caching the first result
pub(crate) async fn resolve(
	scope: LockScope,
	settings: &Settings,
) -> Option<Arc<dyn LockBackend>> {
	match scope {
		LockScope::Host => {
			let backend = HOST_BACKEND
				.get_or_init(|| async { probe_host(settings).await })
				.await;
			Some(Arc::clone(backend))
		}
		LockScope::Cluster => CLUSTER_BACKEND
			.get_or_init(|| async { probe_cluster(settings).await })
			.await
			.clone(),
	}
}

/// Walk the host-scope ladder.
///
/// The in-process semaphore table is always available, so `Auto` stops
/// there; the other variants are reached through an explicit preference.
/// A preferred shared backend that turns out unusable falls back to the
/// table rather than leaving the scope without locks.
async fn probe_host(settings: &Settings) -> Arc<dyn LockBackend> {
	let preference = settings.locks.host_backend;
	let backend: Arc<dyn LockBackend> = match preference {
		LockPreference::Auto | LockPreference::Semaphore => Arc::new(LocalSemaphores::new()),
		LockPreference::File => Arc::new(FileLocks::new(settings.locks.dir.clone())),
		LockPreference::Redis => match redis_claims(settings).await {
			Some(backend) => backend,
			None => {
				tracing::warn!("preferred redis lock backend unavailable, using in-process semaphores");
				Arc::new(LocalSemaphores::new())
			}
		},
		LockPreference::Memcached => match memcached_claims(settings).await {
			Some(backend) => backend,
			None => {
				tracing::warn!("preferred memcached lock backend unavailable, using in-process semaphores");
				Arc::new(LocalSemaphores::new())
			}
		},
	};
	tracing::debug!(backend = backend.kind(), "resolved host lock backend");
	backend
}

/// Walk the cluster-scope ladder: redis, then memcached.
///
/// Cluster locks require a shared backend; with none configured the scope
/// resolves to nothing and acquisition fails.
async fn probe_cluster(settings: &Settings) -> Option<Arc<dyn LockBackend>> {
	if let Some(backend) = redis_claims(settings).await {
		tracing::debug!(backend = backend.kind(), "resolved cluster lock backend");
		return Some(backend);
	}
	if let Some(backend) = memcached_claims(settings).await {
		tracing::debug!(backend = backend.kind(), "resolved cluster lock backend");
		return Some(backend);
	}
	tracing::warn!("no shared backend available for cluster locks");
	None
}

#[cfg(feature = "redis")]
async fn redis_claims(settings: &Settings) -> Option<Arc<dyn LockBackend>> {
	if !settings.stores.has_redis() {
		return None;
	}
	match grappelli_store::handles::redis_handle(&settings.stores.redis_servers).await {
		Ok(store) => Some(Arc::new(crate::shared::RedisClaims::new(store))),
		Err(e) => {
			tracing::warn!(error = %e, "redis unavailable for lock claims");
			None
		}
	}
}

#[cfg(not(feature = "redis"))]
async fn redis_claims(_settings: &Settings) -> Option<Arc<dyn LockBackend>> {
	None
}

#[cfg(feature = "memcached")]
async fn memcached_claims(settings: &Settings) -> Option<Arc<dyn LockBackend>> {
	if !settings.stores.has_memcached() {
		return None;
	}
	match grappelli_store::handles::memcached_handle(&settings.stores.memcached_servers).await {
		Ok(store) => Some(Arc::new(crate::shared::MemcachedClaims::new(store))),
		Err(e) => {
			tracing::warn!(error = %e, "memcached unavailable for lock claims");
			None
		}
	}
}

#[cfg(not(feature = "memcached"))]
async fn memcached_claims(_settings: &Settings) -> Option<Arc<dyn LockBackend>> {
	None
}

//! # Grappelli Locks
//!
//! Named blocking locks with two scopes of exclusion.
//!
//! A [`Semaphore`] excludes other holders of the same name either across the
//! processes of one host or across a whole cluster. The backend serving each
//! scope is resolved once per process through a priority-ordered capability
//! probe and then cached.
//!
//! ## Features
//!
//! - **Closed backend set**: in-process semaphore table, advisory file
//!   locks, redis claims, memcached claims
//! - **Boolean failure signals**: `lock`/`unlock` report failure as `false`
//!   rather than errors, with detail on the tracing output
//! - **Busy-wait claims**: shared backends poll an atomic add-if-absent at a
//!   fixed interval, with no timeout
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grappelli_conf::Settings;
//! use grappelli_locks::Semaphore;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let settings = Arc::new(Settings::default());
//! let mut lock = Semaphore::host("nightly-report", settings);
//! if lock.lock().await {
//!     // exclusive section
//!     lock.unlock().await;
//! }
//! # }
//! ```

use grappelli_conf::Settings;
use std::sync::Arc;
use std::time::Duration;

pub mod backend;
pub mod error;
pub mod file;
pub mod local;

#[cfg(any(feature = "redis", feature = "memcached"))]
pub mod shared;

// Re-export commonly used types at the crate root for convenience
pub use backend::{HeldLock, LockBackend};
pub use error::LockError;

/// Fixed sleep between claim attempts for busy-wait backends
pub const RETRY_INTERVAL: Duration = Duration::from_millis(3);

/// Scope of exclusion for a named lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
	/// Excludes holders across the processes of one host
	Host,
	/// Excludes holders across every host sharing a backend
	Cluster,
}

impl LockScope {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Host => "host",
			Self::Cluster => "cluster",
		}
	}
}

/// A named, blocking mutual-exclusion lock.
///
/// For any two instances sharing a name and scope, at most one is locked at
/// any instant. Instances start unlocked; dropping a locked instance
/// releases the underlying resource (best-effort for claim backends).
///
/// Failures surface as boolean returns rather than errors: callers treat
/// locking as best-effort-capable infrastructure and decide themselves how
/// to proceed without exclusion.
#[derive(Debug)]
pub struct Semaphore {
	name: String,
	scope: LockScope,
	settings: Arc<Settings>,
	backend: Option<Arc<dyn LockBackend>>,
	held: Option<HeldLock>,
}

impl Semaphore {
	pub fn new(name: impl Into<String>, scope: LockScope, settings: Arc<Settings>) -> Self {
		Self {
			name: name.into(),
			scope,
			settings,
			backend: None,
			held: None,
		}
	}

	/// Lock scoped to the processes of this host
	pub fn host(name: impl Into<String>, settings: Arc<Settings>) -> Self {
		Self::new(name, LockScope::Host, settings)
	}

	/// Lock scoped to every host sharing a backend
	pub fn cluster(name: impl Into<String>, settings: Arc<Settings>) -> Self {
		Self::new(name, LockScope::Cluster, settings)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn scope(&self) -> LockScope {
		self.scope
	}

	/// Whether this instance currently holds the lock
	pub fn is_locked(&self) -> bool {
		self.held.is_some()
	}

	/// Block until the lock is held.
	///
	/// Returns `false` without acquiring when this instance already holds
	/// the lock, when the scope has no usable backend, or when the backend
	/// reports a hard error. Contention never returns `false`; the call
	/// keeps waiting.
	pub async fn lock(&mut self) -> bool {
		if self.held.is_some() {
			tracing::warn!(name = %self.name, "lock() called while already held");
			return false;
		}

		let Some(backend) = self.backend().await else {
			return false;
		};

		match backend.acquire(&self.name).await {
			Ok(held) => {
				self.held = Some(held);
				true
			}
			Err(e) => {
				tracing::warn!(name = %self.name, scope = self.scope.as_str(), error = %e, "lock acquisition failed");
				false
			}
		}
	}

	/// Release the lock.
	///
	/// Returns `false` when this instance does not hold the lock, and when
	/// the underlying resource was independently invalidated, such as a
	/// claim key evicted by the backend. The instance is unlocked afterward
	/// in every case.
	pub async fn unlock(&mut self) -> bool {
		let Some(held) = self.held.take() else {
			return false;
		};
		let Some(backend) = self.backend.clone() else {
			return false;
		};
		backend.release(&self.name, held).await
	}

	async fn backend(&mut self) -> Option<Arc<dyn LockBackend>> {
		if self.backend.is_none() {
			self.backend = backend::resolve(self.scope, &self.settings).await;
			if self.backend.is_none() {
				tracing::warn!(
					name = %self.name,
					scope = self.scope.as_str(),
					"no lock backend available"
				);
			}
		}
		self.backend.clone()
	}
}

impl Drop for Semaphore {
	fn drop(&mut self) {
		let Some(held) = self.held.take() else {
			return;
		};
		match held {
			// Guard and descriptor drops release these on their own
			HeldLock::Local(_) | HeldLock::File(_) => {}
			HeldLock::Claim { .. } => {
				let Some(backend) = self.backend.clone() else {
					return;
				};
				let name = std::mem::take(&mut self.name);
				match tokio::runtime::Handle::try_current() {
					Ok(handle) => {
						handle.spawn(async move {
							backend.release(&name, held).await;
						});
					}
					Err(_) => {
						tracing::warn!(name = %name, "held claim dropped outside a runtime; claim key orphaned");
					}
				}
			}
		}
	}
}

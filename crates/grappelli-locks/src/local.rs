//! In-process semaphore table
//!
//! One async mutex per lock name, shared across every `Semaphore` instance
//! in the process. Acquisition parks the task instead of polling. Entries
//! stay in the table once created so that all instances of a name keep
//! contending on the same mutex.

use crate::backend::{HeldLock, LockBackend};
use crate::error::LockError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

static TABLE: Lazy<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>> =
	Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Default)]
pub struct LocalSemaphores;

impl LocalSemaphores {
	pub fn new() -> Self {
		Self
	}

	fn slot(name: &str) -> Arc<tokio::sync::Mutex<()>> {
		let mut table = TABLE.lock();
		table.entry(name.to_string()).or_default().clone()
	}
}

#[async_trait]
impl LockBackend for LocalSemaphores {
	async fn acquire(&self, name: &str) -> Result<HeldLock, LockError> {
		let guard = Self::slot(name).lock_owned().await;
		Ok(HeldLock::Local(guard))
	}

	async fn release(&self, _name: &str, held: HeldLock) -> bool {
		match held {
			HeldLock::Local(guard) => {
				drop(guard);
				true
			}
			_ => false,
		}
	}

	fn kind(&self) -> &'static str {
		"semaphore"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	#[tokio::test]
	async fn same_name_excludes_concurrent_holders() {
		let backend = Arc::new(LocalSemaphores::new());
		let holders = Arc::new(AtomicUsize::new(0));
		let mut tasks = Vec::new();

		for _ in 0..8 {
			let backend = Arc::clone(&backend);
			let holders = Arc::clone(&holders);
			tasks.push(tokio::spawn(async move {
				let held = backend.acquire("contended").await.unwrap();
				assert_eq!(holders.fetch_add(1, Ordering::SeqCst), 0);
				tokio::time::sleep(Duration::from_millis(2)).await;
				assert_eq!(holders.fetch_sub(1, Ordering::SeqCst), 1);
				assert!(backend.release("contended", held).await);
			}));
		}

		for task in tasks {
			task.await.unwrap();
		}
	}

	#[tokio::test]
	async fn different_names_do_not_contend() {
		let backend = LocalSemaphores::new();
		let first = backend.acquire("alpha").await.unwrap();
		// A distinct name acquires immediately even while alpha is held
		let second = backend.acquire("beta").await.unwrap();
		assert!(backend.release("alpha", first).await);
		assert!(backend.release("beta", second).await);
	}

	#[tokio::test]
	async fn release_rejects_foreign_holds() {
		let backend = LocalSemaphores::new();
		assert!(
			!backend
				.release("anything", HeldLock::Claim { key: "k".to_string() })
				.await
		);
	}
}

//! Cluster-scope resolution without a shared backend
//!
//! Runs in its own binary: the failed probe is cached process-wide, which
//! is exactly the behavior under test.

use grappelli_conf::Settings;
use grappelli_locks::Semaphore;
use std::sync::Arc;

#[tokio::test]
async fn cluster_scope_without_backend_fails_to_lock() {
	let settings = Arc::new(Settings::default());

	let mut lock = Semaphore::cluster("orphan", Arc::clone(&settings));
	assert!(!lock.lock().await);
	assert!(!lock.is_locked());
	assert!(!lock.unlock().await);

	// The cached probe result keeps failing for later instances too
	let mut again = Semaphore::cluster("orphan", settings);
	assert!(!again.lock().await);
}

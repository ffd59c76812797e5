#![cfg(feature = "memcached")]

//! Cluster-scope locking over a live memcached backend

use grappelli_conf::Settings;
use grappelli_locks::Semaphore;
use std::sync::Arc;
use std::time::Duration;

fn settings() -> Arc<Settings> {
	Arc::new(Settings::default().with_memcached_servers(vec!["127.0.0.1:11211".to_string()]))
}

#[tokio::test]
#[ignore] // Requires running memcached server on localhost:11211
async fn cluster_lock_round_trip() {
	let mut lock = Semaphore::cluster("memcached-cycle", settings());
	assert!(lock.lock().await);
	assert!(lock.is_locked());
	assert!(lock.unlock().await);
	assert!(!lock.is_locked());
}

#[tokio::test]
#[ignore] // Requires running memcached server on localhost:11211
async fn contender_blocks_until_release() {
	let settings = settings();
	let mut holder = Semaphore::cluster("memcached-queue", Arc::clone(&settings));
	assert!(holder.lock().await);

	let contender = tokio::spawn({
		let settings = Arc::clone(&settings);
		async move {
			let mut lock = Semaphore::cluster("memcached-queue", settings);
			assert!(lock.lock().await);
			lock.unlock().await
		}
	});

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert!(!contender.is_finished());

	assert!(holder.unlock().await);
	assert!(tokio::time::timeout(Duration::from_secs(5), contender)
		.await
		.expect("contender should finish once the claim is deleted")
		.unwrap());
}

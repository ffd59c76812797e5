//! Host-scope semaphore behavior over the in-process backend

use grappelli_conf::Settings;
use grappelli_locks::Semaphore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn settings() -> Arc<Settings> {
	Arc::new(Settings::default())
}

#[tokio::test]
async fn lock_unlock_cycle() {
	let mut lock = Semaphore::host("cycle", settings());
	assert!(!lock.is_locked());

	assert!(lock.lock().await);
	assert!(lock.is_locked());

	assert!(lock.unlock().await);
	assert!(!lock.is_locked());
}

#[tokio::test]
async fn unlock_without_lock_signals_failure() {
	let mut lock = Semaphore::host("never-held", settings());
	assert!(!lock.unlock().await);
}

#[tokio::test]
async fn unlock_twice_signals_failure_the_second_time() {
	let mut lock = Semaphore::host("double-unlock", settings());
	assert!(lock.lock().await);
	assert!(lock.unlock().await);
	assert!(!lock.unlock().await);
}

#[tokio::test]
async fn lock_while_held_is_refused() {
	let mut lock = Semaphore::host("reentrant", settings());
	assert!(lock.lock().await);
	assert!(!lock.lock().await);
	assert!(lock.is_locked());
	assert!(lock.unlock().await);
}

#[tokio::test]
async fn another_instance_acquires_after_release() {
	let settings = settings();
	let mut first = Semaphore::host("handover", Arc::clone(&settings));
	assert!(first.lock().await);
	assert!(first.unlock().await);

	let mut second = Semaphore::host("handover", settings);
	assert!(second.lock().await);
	assert!(second.unlock().await);
}

#[tokio::test]
async fn contender_blocks_until_release() {
	let settings = settings();
	let mut holder = Semaphore::host("queue", Arc::clone(&settings));
	assert!(holder.lock().await);

	let contender = tokio::spawn({
		let settings = Arc::clone(&settings);
		async move {
			let mut lock = Semaphore::host("queue", settings);
			assert!(lock.lock().await);
			lock.unlock().await
		}
	});

	tokio::time::sleep(Duration::from_millis(50)).await;
	assert!(!contender.is_finished());

	assert!(holder.unlock().await);
	assert!(tokio::time::timeout(Duration::from_secs(5), contender)
		.await
		.expect("contender should finish once the lock is free")
		.unwrap());
}

#[tokio::test]
async fn dropping_a_held_lock_releases_it() {
	let settings = settings();
	{
		let mut lock = Semaphore::host("dropped", Arc::clone(&settings));
		assert!(lock.lock().await);
	}

	// Would block forever if the drop had not released
	let mut lock = Semaphore::host("dropped", settings);
	assert!(
		tokio::time::timeout(Duration::from_secs(5), lock.lock())
			.await
			.expect("lock should be free after the holder was dropped")
	);
	assert!(lock.unlock().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_holders_exclude_each_other() {
	const TASKS: usize = 8;
	const ROUNDS: usize = 5;

	let settings = settings();
	let holders = Arc::new(AtomicUsize::new(0));
	let mut tasks = Vec::new();

	for _ in 0..TASKS {
		let settings = Arc::clone(&settings);
		let holders = Arc::clone(&holders);
		tasks.push(tokio::spawn(async move {
			for _ in 0..ROUNDS {
				let mut lock = Semaphore::host("storm", Arc::clone(&settings));
				assert!(lock.lock().await);

				assert_eq!(holders.fetch_add(1, Ordering::SeqCst), 0, "second holder observed");
				tokio::time::sleep(Duration::from_millis(1)).await;
				assert_eq!(holders.fetch_sub(1, Ordering::SeqCst), 1);

				assert!(lock.unlock().await);
			}
		}));
	}

	for task in tasks {
		task.await.unwrap();
	}
}

#[tokio::test]
async fn distinct_names_do_not_contend() {
	let settings = settings();
	let mut alpha = Semaphore::host("alpha", Arc::clone(&settings));
	let mut beta = Semaphore::host("beta", settings);

	assert!(alpha.lock().await);
	assert!(
		tokio::time::timeout(Duration::from_secs(1), beta.lock())
			.await
			.expect("an unrelated name should acquire immediately")
	);

	assert!(alpha.unlock().await);
	assert!(beta.unlock().await);
}

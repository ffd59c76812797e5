//! End-to-end flows through the crate facade

use grappelli::prelude::*;
use grappelli::SerializationError;
use rstest::rstest;
use serde_json::Value;
use std::any::Any;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
	id: i64,
	name: String,
}

impl Packable for Profile {
	fn kind(&self) -> &'static str {
		"Profile"
	}

	fn pack(&self) -> Result<Value, SerializationError> {
		Ok(serde_json::to_value(self)?)
	}

	fn clone_packable(&self) -> Box<dyn Packable> {
		Box::new(self.clone())
	}

	fn as_any(&self) -> &dyn Any {
		self
	}
}

impl Unpack for Profile {
	const KIND: &'static str = "Profile";

	fn unpack(payload: Value) -> Result<Self, SerializationError> {
		serde_json::from_value(payload).map_err(|e| SerializationError::Rebuild {
			kind: Self::KIND.to_string(),
			reason: e.to_string(),
		})
	}
}

register_packable!(Profile);

fn meta() -> RequestMeta {
	RequestMeta::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)))
}

#[rstest]
#[case(SessionValue::from(true))]
#[case(SessionValue::from(42i64))]
#[case(SessionValue::from("text"))]
#[case(SessionValue::List(vec![SessionValue::from(1), SessionValue::from("two")]))]
fn envelopes_round_trip_through_the_facade(#[case] value: SessionValue) {
	let envelope = encode(&value).unwrap();
	assert_eq!(decode(&envelope).unwrap(), value);
}

#[tokio::test]
async fn file_backed_sessions_rebuild_custom_types() {
	let dir = tempfile::tempdir().unwrap();
	let settings = Arc::new(Settings::default().with_session_dir(dir.path().to_path_buf()));
	let engine = SessionEngine::from_settings(settings).await.unwrap();

	let profile = Profile {
		id: 7,
		name: "a".to_string(),
	};

	let mut first = engine.open(&meta()).await.unwrap();
	assert_eq!(first.state(), LifecycleState::Fresh);
	first.set_static("user", SessionValue::custom(profile.clone()));
	let id = first.id().to_string();
	first.finalize(true).await.unwrap();

	let mut second = engine.open(&meta().with_session_id(id)).await.unwrap();
	assert_eq!(second.state(), LifecycleState::Active);
	let restored = second.get_static("user").unwrap().unwrap();
	assert_eq!(restored.as_custom::<Profile>(), Some(&profile));
	second.finalize(true).await.unwrap();
}

#[tokio::test]
async fn host_locks_work_through_the_facade() {
	let settings = Arc::new(Settings::default());
	let mut lock = Semaphore::host("facade-smoke", Arc::clone(&settings));
	assert_eq!(lock.scope(), LockScope::Host);

	assert!(lock.lock().await);
	assert!(lock.is_locked());
	assert!(lock.unlock().await);
	assert!(!lock.is_locked());
}

//! Registration and decoding of custom types from a consuming crate

use grappelli_codec::{
	decode, encode, register_packable, registered_kinds, Packable, SerializationError,
	SessionValue, Unpack,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
	username: String,
	theme: String,
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

fn profile() -> Profile {
	Profile {
		username: "django".to_string(),
		theme: "dark".to_string(),
	}
}

#[test]
fn registration_is_visible_from_outside_the_crate() {
	assert!(registered_kinds().contains(&"Profile"));
}

#[test]
fn custom_type_round_trips_through_the_envelope() {
	let envelope = encode(&SessionValue::custom(profile())).unwrap();
	let decoded = decode(&envelope).unwrap();
	assert_eq!(decoded.as_custom::<Profile>(), Some(&profile()));
}

#[test]
fn cloned_customs_stay_equal() {
	let original = SessionValue::custom(profile());
	let copied = original.clone();
	assert_eq!(original, copied);
}

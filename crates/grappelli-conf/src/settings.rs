//! Typed settings for session storage, distributed backends, and locking.

use crate::env::{Env, EnvError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while loading or validating settings
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
	#[error(transparent)]
	Env(#[from] EnvError),

	#[error("Invalid value for {key}: {reason}")]
	InvalidValue { key: String, reason: String },

	#[error("Settings validation failed: {0}")]
	Validation(String),
}

/// Which persistent store backs session data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStorage {
	/// File-backed storage in a local directory
	Default,
	/// Memcached-shaped distributed store
	Memcached,
	/// Redis-shaped distributed store
	Redis,
}

impl FromStr for SessionStorage {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"default" => Ok(Self::Default),
			"memcached" => Ok(Self::Memcached),
			"redis" => Ok(Self::Redis),
			other => Err(format!("unknown session storage '{}'", other)),
		}
	}
}

/// Preferred host-scope lock backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockPreference {
	/// Walk the capability ladder and take the first available backend
	Auto,
	/// In-process semaphore table
	Semaphore,
	/// Advisory per-name lock files
	File,
	/// Redis claim keys
	Redis,
	/// Memcached claim keys
	Memcached,
}

impl FromStr for LockPreference {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"auto" => Ok(Self::Auto),
			"semaphore" => Ok(Self::Semaphore),
			"file" => Ok(Self::File),
			"redis" => Ok(Self::Redis),
			"memcached" => Ok(Self::Memcached),
			other => Err(format!("unknown lock backend '{}'", other)),
		}
	}
}

/// Session lifecycle and storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
	/// Seconds until a session id must be renewed; 0 = unbounded
	pub lifetime_secs: u32,
	/// Grace window in seconds during which a renewed-away id stays readable
	pub transition_secs: u32,
	/// Which store persists session data
	pub storage: SessionStorage,
	/// Name of the session cookie surfaced to the response layer
	pub cookie_name: String,
	/// Directory for file-backed session storage; defaults to a temp subdirectory
	pub file_dir: Option<PathBuf>,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			lifetime_secs: 3600,
			transition_secs: 0,
			storage: SessionStorage::Default,
			cookie_name: "sessionid".to_string(),
			file_dir: None,
		}
	}
}

/// Distributed backend connection lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
	/// Memcached `host:port` addresses; empty = not configured
	pub memcached_servers: Vec<String>,
	/// Redis connection URLs; empty = not configured, first entry is used
	pub redis_servers: Vec<String>,
}

impl StoreSettings {
	/// Whether any memcached server is configured
	pub fn has_memcached(&self) -> bool {
		!self.memcached_servers.is_empty()
	}

	/// Whether any redis server is configured
	pub fn has_redis(&self) -> bool {
		!self.redis_servers.is_empty()
	}
}

/// Lock backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
	/// Directory for advisory lock files; defaults to a temp subdirectory
	pub dir: Option<PathBuf>,
	/// Host-scope backend preference
	pub host_backend: LockPreference,
}

impl Default for LockSettings {
	fn default() -> Self {
		Self {
			dir: None,
			host_backend: LockPreference::Auto,
		}
	}
}

/// Top-level settings consumed by the session and lock layers
///
/// # Examples
///
/// ```rust
/// use grappelli_conf::{Settings, SessionStorage};
///
/// let settings = Settings::default()
///     .with_lifetime(7200)
///     .with_transition(30)
///     .with_storage(SessionStorage::Redis)
///     .with_redis_servers(vec!["redis://127.0.0.1/".to_string()]);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub debug: bool,
	pub session: SessionSettings,
	pub stores: StoreSettings,
	pub locks: LockSettings,
}

impl Settings {
	/// Load settings from `GRAPPELLI_`-prefixed environment variables
	///
	/// Unset variables fall back to their defaults. The result is validated
	/// before being returned.
	pub fn from_env() -> Result<Self, SettingsError> {
		let env = Env::new().with_prefix("GRAPPELLI_");
		let defaults = Self::default();

		let storage_raw =
			env.str_with_default("SESSION_STORAGE", "default");
		let storage = SessionStorage::from_str(&storage_raw).map_err(|reason| {
			SettingsError::InvalidValue {
				key: "GRAPPELLI_SESSION_STORAGE".to_string(),
				reason,
			}
		})?;

		let lock_backend_raw = env.str_with_default("LOCK_BACKEND", "auto");
		let host_backend = LockPreference::from_str(&lock_backend_raw).map_err(|reason| {
			SettingsError::InvalidValue {
				key: "GRAPPELLI_LOCK_BACKEND".to_string(),
				reason,
			}
		})?;

		let settings = Self {
			debug: env.bool_with_default("DEBUG", false)?,
			session: SessionSettings {
				lifetime_secs: env
					.u32_with_default("SESSION_LIFETIME", defaults.session.lifetime_secs)?,
				transition_secs: env
					.u32_with_default("SESSION_TRANSITION", defaults.session.transition_secs)?,
				storage,
				cookie_name: env
					.str_with_default("SESSION_COOKIE_NAME", &defaults.session.cookie_name),
				file_dir: env.path_opt("SESSION_FILE_DIR"),
			},
			stores: StoreSettings {
				memcached_servers: env.list_with_default("MEMCACHED_SERVERS", vec![]),
				redis_servers: env.list_with_default("REDIS_SERVERS", vec![]),
			},
			locks: LockSettings {
				dir: env.path_opt("LOCK_DIR"),
				host_backend,
			},
		};

		settings.validate()?;
		Ok(settings)
	}

	/// Check cross-field constraints
	///
	/// The transition grace window must fit inside a bounded lifetime. An
	/// unbounded lifetime (0) places no bound on the window, since manual id
	/// renewal still uses it.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.session.lifetime_secs > 0
			&& self.session.transition_secs > self.session.lifetime_secs
		{
			return Err(SettingsError::Validation(format!(
				"session transition ({}s) exceeds session lifetime ({}s)",
				self.session.transition_secs, self.session.lifetime_secs
			)));
		}
		Ok(())
	}

	/// Set the session lifetime in seconds (0 = unbounded)
	pub fn with_lifetime(mut self, seconds: u32) -> Self {
		self.session.lifetime_secs = seconds;
		self
	}

	/// Set the transition grace window in seconds
	pub fn with_transition(mut self, seconds: u32) -> Self {
		self.session.transition_secs = seconds;
		self
	}

	/// Select the session storage backend
	pub fn with_storage(mut self, storage: SessionStorage) -> Self {
		self.session.storage = storage;
		self
	}

	/// Set the session cookie name
	pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
		self.session.cookie_name = name.into();
		self
	}

	/// Set the directory for file-backed session storage
	pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.session.file_dir = Some(dir.into());
		self
	}

	/// Set the memcached server list
	pub fn with_memcached_servers(mut self, servers: Vec<String>) -> Self {
		self.stores.memcached_servers = servers;
		self
	}

	/// Set the redis server list
	pub fn with_redis_servers(mut self, servers: Vec<String>) -> Self {
		self.stores.redis_servers = servers;
		self
	}

	/// Set the directory for advisory lock files
	pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.locks.dir = Some(dir.into());
		self
	}

	/// Set the host-scope lock backend preference
	pub fn with_host_lock_backend(mut self, preference: LockPreference) -> Self {
		self.locks.host_backend = preference;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[test]
	fn defaults_are_valid() {
		let settings = Settings::default();
		assert_eq!(settings.session.lifetime_secs, 3600);
		assert_eq!(settings.session.transition_secs, 0);
		assert_eq!(settings.session.storage, SessionStorage::Default);
		assert_eq!(settings.session.cookie_name, "sessionid");
		assert!(!settings.stores.has_memcached());
		assert!(!settings.stores.has_redis());
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn transition_must_fit_in_bounded_lifetime() {
		let settings = Settings::default().with_lifetime(60).with_transition(120);
		assert!(matches!(
			settings.validate(),
			Err(SettingsError::Validation(_))
		));
	}

	#[test]
	fn transition_unconstrained_when_lifetime_unbounded() {
		let settings = Settings::default().with_lifetime(0).with_transition(600);
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn transition_equal_to_lifetime_is_allowed() {
		let settings = Settings::default().with_lifetime(60).with_transition(60);
		assert!(settings.validate().is_ok());
	}

	#[rstest]
	#[case("default", SessionStorage::Default)]
	#[case("MEMCACHED", SessionStorage::Memcached)]
	#[case(" redis ", SessionStorage::Redis)]
	fn storage_parses_case_insensitively(#[case] raw: &str, #[case] expected: SessionStorage) {
		assert_eq!(SessionStorage::from_str(raw).unwrap(), expected);
	}

	#[test]
	fn storage_rejects_unknown_names() {
		assert!(SessionStorage::from_str("mongodb").is_err());
		assert!(LockPreference::from_str("zookeeper").is_err());
	}

	#[test]
	#[serial]
	fn from_env_reads_prefixed_variables() {
		unsafe {
			std::env::set_var("GRAPPELLI_SESSION_LIFETIME", "7200");
			std::env::set_var("GRAPPELLI_SESSION_STORAGE", "redis");
			std::env::set_var("GRAPPELLI_REDIS_SERVERS", "redis://a/,redis://b/");
		}

		let settings = Settings::from_env().unwrap();
		assert_eq!(settings.session.lifetime_secs, 7200);
		assert_eq!(settings.session.storage, SessionStorage::Redis);
		assert_eq!(settings.stores.redis_servers.len(), 2);

		unsafe {
			std::env::remove_var("GRAPPELLI_SESSION_LIFETIME");
			std::env::remove_var("GRAPPELLI_SESSION_STORAGE");
			std::env::remove_var("GRAPPELLI_REDIS_SERVERS");
		}
	}

	#[test]
	#[serial]
	fn from_env_rejects_bad_storage_name() {
		unsafe {
			std::env::set_var("GRAPPELLI_SESSION_STORAGE", "tape");
		}

		let result = Settings::from_env();
		assert!(matches!(
			result,
			Err(SettingsError::InvalidValue { .. })
		));

		unsafe {
			std::env::remove_var("GRAPPELLI_SESSION_STORAGE");
		}
	}
}

//! # Grappelli Configuration
//!
//! Typed settings for the grappelli session and locking stack.
//!
//! Settings are plain serde-friendly structs with sensible defaults, loadable
//! from `GRAPPELLI_`-prefixed environment variables or assembled in code with
//! the `with_*` builders.
//!
//! ## Features
//!
//! - **Environment loading**: `Settings::from_env()` with per-field fallbacks
//! - **Validation**: cross-field checks such as the transition/lifetime bound
//! - **Backend selection**: session storage and lock backend preferences
//!
//! ## Quick Start
//!
//! ```rust
//! use grappelli_conf::{Settings, SessionStorage};
//!
//! let settings = Settings::default()
//!     .with_lifetime(1800)
//!     .with_storage(SessionStorage::Default);
//! settings.validate().expect("valid settings");
//! ```

pub mod env;
pub mod settings;

// Re-export commonly used types at the crate root for convenience
pub use env::{Env, EnvError};
pub use settings::{
	LockPreference, LockSettings, SessionSettings, SessionStorage, Settings, SettingsError,
	StoreSettings,
};

//! Environment variable reader with prefix support
//!
//! Provides typed access to environment variables for settings loading.
//! All lookups go through an optional prefix so that deployments can scope
//! their variables (e.g. `GRAPPELLI_SESSION_LIFETIME`).

use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading environment variables
#[derive(Debug, Error)]
pub enum EnvError {
	#[error("Missing environment variable: {0}")]
	MissingVariable(String),

	#[error("Failed to parse environment variable '{key}': {error}")]
	ParseError { key: String, error: String },
}

/// Environment variable reader with prefix support
#[derive(Debug, Clone, Default)]
pub struct Env {
	/// Optional prefix for environment variables (e.g. "GRAPPELLI_")
	pub prefix: Option<String>,
}

impl Env {
	/// Create a new Env instance
	pub fn new() -> Self {
		Self { prefix: None }
	}

	/// Set a prefix for all environment variable lookups
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	/// Get the full key name with prefix
	fn full_key(&self, key: &str) -> String {
		match &self.prefix {
			Some(prefix) => format!("{}{}", prefix, key),
			None => key.to_string(),
		}
	}

	/// Read a required string value
	pub fn str(&self, key: &str) -> Result<String, EnvError> {
		let full_key = self.full_key(key);
		env::var(&full_key).map_err(|_| EnvError::MissingVariable(full_key))
	}

	/// Read a string value with a default
	pub fn str_with_default(&self, key: &str, default: &str) -> String {
		let full_key = self.full_key(key);
		env::var(&full_key).unwrap_or_else(|_| default.to_string())
	}

	/// Read a boolean value with a default
	pub fn bool_with_default(&self, key: &str, default: bool) -> Result<bool, EnvError> {
		let full_key = self.full_key(key);
		match env::var(&full_key) {
			Ok(val) => parse_bool(&val).map_err(|error| EnvError::ParseError {
				key: full_key,
				error,
			}),
			Err(_) => Ok(default),
		}
	}

	/// Read an unsigned integer value with a default
	pub fn u32_with_default(&self, key: &str, default: u32) -> Result<u32, EnvError> {
		let full_key = self.full_key(key);
		match env::var(&full_key) {
			Ok(val) => val.parse::<u32>().map_err(|e| EnvError::ParseError {
				key: full_key,
				error: e.to_string(),
			}),
			Err(_) => Ok(default),
		}
	}

	/// Read a list value with a default (comma-separated)
	pub fn list_with_default(&self, key: &str, default: Vec<String>) -> Vec<String> {
		let full_key = self.full_key(key);
		match env::var(&full_key) {
			Ok(val) => parse_list(&val),
			Err(_) => default,
		}
	}

	/// Read an optional path value
	pub fn path_opt(&self, key: &str) -> Option<PathBuf> {
		let full_key = self.full_key(key);
		env::var(&full_key).ok().map(PathBuf::from)
	}
}

/// Parse a boolean from common environment spellings
pub fn parse_bool(value: &str) -> Result<bool, String> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		other => Err(format!("not a boolean: '{}'", other)),
	}
}

/// Parse a comma-separated list, trimming whitespace and dropping empties
pub fn parse_list(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

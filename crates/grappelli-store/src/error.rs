//! Store error types

use thiserror::Error;

/// Errors raised by the key-value store clients
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// The backend rejected an operation or the connection failed
	#[error("Store backend error: {0}")]
	Backend(String),

	/// The requested backend has no servers configured
	#[error("Store backend '{0}' is not configured")]
	NotConfigured(&'static str),
}

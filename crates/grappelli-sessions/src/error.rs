//! Session error types

use grappelli_codec::SerializationError;
use grappelli_store::StoreError;
use thiserror::Error;

/// Errors raised by the session layer
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
	#[error(transparent)]
	Serialization(#[from] SerializationError),

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Session operations were requested without usable persistent storage
	#[error("Session storage is unavailable: {0}")]
	StorageUnavailable(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

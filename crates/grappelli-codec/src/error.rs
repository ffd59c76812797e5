//! Codec error types

use thiserror::Error;

/// Errors raised while encoding or decoding session value envelopes
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SerializationError {
	/// An empty string is never a valid envelope
	#[error("Cannot decode an empty envelope")]
	Empty,

	/// The envelope text does not follow the wire format
	#[error("Malformed envelope: {0}")]
	Malformed(String),

	/// A custom envelope names a kind with no registered reviver
	#[error("No packable type registered for kind '{0}'")]
	UnknownKind(String),

	/// A registered reviver rejected the payload
	#[error("Failed to rebuild value of kind '{kind}': {reason}")]
	Rebuild { kind: String, reason: String },

	#[error("JSON serialization failed: {0}")]
	Json(#[from] serde_json::Error),
}

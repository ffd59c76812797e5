//! Lock error types
//!
//! These errors stay internal to the crate surface: `Semaphore` flattens
//! them into boolean failure signals and reports detail through tracing.

use thiserror::Error;

/// Errors raised by lock backends
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LockError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Lock backend error: {0}")]
	Backend(String),
}

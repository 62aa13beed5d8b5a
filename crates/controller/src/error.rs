//! Error types for dispatch, the synchronous adapter, persistence and configuration.

use std::path::PathBuf;

use steward_model::ModelError;
use thiserror::Error;

use crate::failure::{FailureCause, FailureDescription, PANIC_KIND};

/// Failures raised before or while synchronously invoking a handler.
///
/// These never escape [`ModelController::execute`](crate::ModelController::execute);
/// they are reported to the caller's result handler as a [`FailureDescription`].
#[derive(Debug, Error)]
pub enum DispatchError {
	/// The operation was malformed or its address did not resolve.
	#[error(transparent)]
	Model(#[from] ModelError),

	/// No handler is registered for the operation at its address.
	#[error("no handler for operation '{name}' at {address}")]
	NoHandler {
		/// Display form of the operation address.
		address: String,
		/// Operation name.
		name: String,
	},

	/// The context factory failed.
	#[error("failed to build operation context: {0}")]
	Context(#[source] anyhow::Error),

	/// The handler failed before returning a cancellation handle.
	#[error("handler failed: {0}")]
	Handler(#[source] anyhow::Error),

	/// Setup or synchronous handler invocation panicked.
	#[error("handler panicked: {0}")]
	Panic(String),
}

impl DispatchError {
	/// Builds the failure description reported for this error.
	///
	/// Wrapped errors report their own cause chain so the caller sees the error
	/// the collaborator raised, not this envelope.
	pub fn failure_description(&self) -> FailureDescription {
		match self {
			Self::Model(error) => FailureDescription::from_error(error),
			Self::NoHandler { .. } => FailureDescription::from_error(self),
			Self::Context(error) | Self::Handler(error) => FailureDescription::from_anyhow(error),
			Self::Panic(message) => FailureDescription::new(vec![FailureCause::new(PANIC_KIND, message.clone())]),
		}
	}
}

/// Terminal outcomes other than completion, raised by the synchronous adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncExecutionError {
	/// The operation failed; carries the description the handler reported.
	#[error("operation failed: {0}")]
	OperationFailed(FailureDescription),

	/// The operation was cancelled.
	#[error("operation cancelled")]
	Cancelled,
}

/// Errors raised by a [`ConfigurationPersister`](crate::ConfigurationPersister).
#[derive(Debug, Error)]
pub enum PersistenceError {
	/// Reading or writing the backing file failed.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Path of the file being accessed.
		path: PathBuf,
		/// The underlying I/O error.
		#[source]
		error: std::io::Error,
	},

	/// The model could not be encoded or the stored model could not be decoded.
	#[error("model serialization failed: {0}")]
	Serialization(#[from] serde_json::Error),

	/// The backend refused the write.
	#[error("persistence backend unavailable: {0}")]
	Unavailable(String),
}

/// Errors that can occur when loading controller configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		#[source]
		error: std::io::Error,
	},

	/// The creation operation name is empty.
	#[error("creation-operation must not be empty")]
	EmptyCreationOperation,
}

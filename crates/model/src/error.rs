//! Error types for model navigation and operation parsing.

use thiserror::Error;

/// Errors raised while parsing addresses and operations or navigating the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
	/// A segment of the address does not exist and navigation was not allowed to create it.
	#[error("no model node at {address}: missing segment '{segment}'")]
	NotFound {
		/// Display form of the address being navigated.
		address: String,
		/// First segment that could not be found.
		segment: String,
	},

	/// Navigation reached a leaf value where a composite node was required.
	#[error("model node at {address} is not composite at segment '{segment}'")]
	NotComposite {
		/// Display form of the address being navigated.
		address: String,
		/// Segment that could not be descended into.
		segment: String,
	},

	/// The address could not be parsed.
	#[error("malformed address: {0}")]
	MalformedAddress(String),

	/// The operation does not name the operation to run.
	#[error("operation is missing the 'operation' field")]
	MissingOperationName,

	/// The operation is not a well-formed request.
	#[error("malformed operation: {0}")]
	MalformedOperation(String),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

use thiserror::Error;

/// Errors raised by registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	/// A handler is already registered for this exact pattern and name.
	#[error("duplicate handler registration for '{name}' at {address}")]
	Duplicate {
		/// Display form of the registration pattern.
		address: String,
		/// Operation name.
		name: String,
	},
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

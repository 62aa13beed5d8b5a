use serde::Deserialize;

/// What [`OperationRegistry::register`](crate::OperationRegistry::register) does when
/// the exact (pattern, name) key is already taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
	/// Keep the existing handler and report [`RegistryError::Duplicate`](crate::RegistryError::Duplicate).
	#[default]
	Reject,
	/// Replace the existing handler and hand it back to the caller.
	LastWins,
}

//! Failure descriptions built from error chains.
//!
//! A description is an ordered list of `(kind, message)` causes, outermost
//! first, and is reported with `success = false`. The model form is:
//!
//! ```json
//! {"success": false, "cause": [{"kind": "...", "message": "..."}]}
//! ```

use std::any::{Any, type_name};
use std::error::Error;
use std::fmt;
use std::iter;

use serde::{Deserialize, Serialize};
use serde_json::json;
use steward_handler_registry::RegistryError;
use steward_model::{ModelError, ModelNode};

use crate::error::{ConfigError, DispatchError, PersistenceError, SyncExecutionError};

/// Kind reported for panics caught at the dispatch boundary.
pub const PANIC_KIND: &str = "panic";

/// Kind reported for errors whose concrete type is not known to the controller.
const UNKNOWN_KIND: &str = "error";

/// One link of a failure's cause chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
	pub kind: String,
	pub message: String,
}

impl FailureCause {
	pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			message: message.into(),
		}
	}

	fn from_link(error: &(dyn Error + 'static)) -> Self {
		let kind = match error.downcast_ref::<KindedError>() {
			Some(kinded) => kinded.kind.clone(),
			None => error_kind(error).to_string(),
		};
		Self::new(kind, error.to_string())
	}
}

/// Error that reports a caller-chosen failure kind.
///
/// Handlers wrap their own errors in this to name the kind the caller sees;
/// the message and the rest of the cause chain are those of the wrapped error.
///
/// ```
/// use steward_controller::{FailureDescription, KindedError};
///
/// let error = anyhow::Error::from(KindedError::new("timeout", "upstream did not answer"));
/// let failure = FailureDescription::from_anyhow(&error);
/// assert_eq!(failure.causes()[0].kind, "timeout");
/// assert_eq!(failure.causes()[0].message, "upstream did not answer");
/// ```
#[derive(Debug)]
pub struct KindedError {
	kind: String,
	error: Box<dyn Error + Send + Sync>,
}

impl KindedError {
	pub fn new(kind: impl Into<String>, error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
		Self {
			kind: kind.into(),
			error: error.into(),
		}
	}

	pub fn kind(&self) -> &str {
		&self.kind
	}
}

impl fmt::Display for KindedError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.error, f)
	}
}

impl Error for KindedError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		self.error.source()
	}
}

#[derive(Serialize, Deserialize)]
struct FailureWire {
	success: bool,
	cause: Vec<FailureCause>,
}

/// Structured record of why an operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDescription {
	causes: Vec<FailureCause>,
}

impl FailureDescription {
	pub fn new(causes: Vec<FailureCause>) -> Self {
		Self { causes }
	}

	/// Creates a description with a single cause.
	pub fn single(kind: impl Into<String>, message: impl Into<String>) -> Self {
		Self::new(vec![FailureCause::new(kind, message)])
	}

	/// Walks `error` and its sources, one cause per link.
	pub fn from_error(error: &(dyn Error + 'static)) -> Self {
		Self::from_chain(iter::successors(Some(error), |&link| link.source()))
	}

	/// Walks an [`anyhow::Error`] chain, one cause per link.
	pub fn from_anyhow(error: &anyhow::Error) -> Self {
		Self::from_chain(error.chain())
	}

	fn from_chain<'a>(chain: impl Iterator<Item = &'a (dyn Error + 'static)>) -> Self {
		Self::new(chain.map(FailureCause::from_link).collect())
	}

	pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
		Self::single(PANIC_KIND, panic_message(payload))
	}

	pub fn causes(&self) -> &[FailureCause] {
		&self.causes
	}

	/// Always false; present so the model form carries an explicit marker.
	pub fn success(&self) -> bool {
		false
	}

	pub fn to_model(&self) -> ModelNode {
		json!({
			"success": false,
			"cause": self.causes,
		})
	}

	/// Parses the model form, rejecting records marked successful.
	pub fn from_model(node: &ModelNode) -> Result<Self, serde_json::Error> {
		let wire = FailureWire::deserialize(node)?;
		if wire.success {
			return Err(serde::de::Error::custom("failure description is marked successful"));
		}
		Ok(Self::new(wire.cause))
	}
}

impl fmt::Display for FailureDescription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, cause) in self.causes.iter().enumerate() {
			if idx > 0 {
				f.write_str("; caused by ")?;
			}
			write!(f, "{}: {}", cause.kind, cause.message)?;
		}
		Ok(())
	}
}

/// Resolves the reported kind of one chain link from its concrete type.
fn error_kind(error: &(dyn Error + 'static)) -> &'static str {
	macro_rules! known_kinds {
		($($ty:ty),* $(,)?) => {
			$(
				if error.is::<$ty>() {
					return type_name::<$ty>();
				}
			)*
		};
	}
	known_kinds!(
		ModelError,
		RegistryError,
		DispatchError,
		SyncExecutionError,
		PersistenceError,
		ConfigError,
		std::io::Error,
		serde_json::Error,
		toml::de::Error,
		std::fmt::Error,
		std::num::ParseIntError,
		std::num::ParseFloatError,
		std::str::Utf8Error,
		std::string::FromUtf8Error,
	);
	UNKNOWN_KIND
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&'static str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"panic with a non-string payload".to_string()
	}
}

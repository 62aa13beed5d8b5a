//! Controller configuration loaded from TOML.
//!
//! ```toml
//! creation-operation = "add"
//! duplicate-policy = "reject"
//!
//! [persistence]
//! path = "/var/lib/steward/model.json"
//! pretty = true
//! ```
//!
//! Every field is optional; a missing table or key takes its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use steward_handler_registry::DuplicatePolicy;
use steward_model::ADD;

use crate::error::ConfigError;

/// Settings for one [`BasicModelController`](crate::BasicModelController).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ControllerConfig {
	/// Operation name whose address may be created during navigation.
	pub creation_operation: String,
	/// What happens when a handler is registered twice for the same pattern and name.
	pub duplicate_policy: DuplicatePolicy,
	pub persistence: PersistenceConfig,
}

impl Default for ControllerConfig {
	fn default() -> Self {
		Self {
			creation_operation: ADD.to_string(),
			duplicate_policy: DuplicatePolicy::default(),
			persistence: PersistenceConfig::default(),
		}
	}
}

/// Where and how the model is written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PersistenceConfig {
	/// JSON file backing the model; `None` keeps the model in memory only.
	pub path: Option<PathBuf>,
	/// Write indented JSON.
	pub pretty: bool,
}

impl ControllerConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses the TOML file at `path`.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let input = fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml_str(&input)?;
		tracing::debug!(path = %path.display(), "controller config loaded");
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.creation_operation.trim().is_empty() {
			return Err(ConfigError::EmptyCreationOperation);
		}
		Ok(())
	}
}

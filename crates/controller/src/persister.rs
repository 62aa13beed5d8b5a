//! Durable storage for the model.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use steward_model::ModelNode;
use tempfile::NamedTempFile;

use crate::error::PersistenceError;

/// Durable write-back of the whole model.
pub trait ConfigurationPersister: Send + Sync {
	/// Stores a snapshot of the model.
	fn store(&self, model: &ModelNode) -> Result<(), PersistenceError>;

	/// Loads the last stored model, if any.
	fn load(&self) -> Result<Option<ModelNode>, PersistenceError>;
}

/// Persister for controllers that keep their model in memory only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConfigurationPersister;

impl ConfigurationPersister for NullConfigurationPersister {
	fn store(&self, _model: &ModelNode) -> Result<(), PersistenceError> {
		Ok(())
	}

	fn load(&self) -> Result<Option<ModelNode>, PersistenceError> {
		Ok(None)
	}
}

/// Stores the model as one JSON document.
///
/// Writes go to a temporary file in the target directory which then replaces
/// the target, so readers never see a partially written model.
#[derive(Debug, Clone)]
pub struct JsonFilePersister {
	path: PathBuf,
	pretty: bool,
}

impl JsonFilePersister {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			pretty: false,
		}
	}

	/// Enables indented output.
	#[must_use]
	pub fn pretty(mut self, pretty: bool) -> Self {
		self.pretty = pretty;
		self
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn directory(&self) -> &Path {
		match self.path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir,
			_ => Path::new("."),
		}
	}
}

fn io_error(path: &Path, error: io::Error) -> PersistenceError {
	PersistenceError::Io {
		path: path.to_path_buf(),
		error,
	}
}

impl ConfigurationPersister for JsonFilePersister {
	fn store(&self, model: &ModelNode) -> Result<(), PersistenceError> {
		let dir = self.directory();
		let mut file = NamedTempFile::new_in(dir).map_err(|error| io_error(dir, error))?;
		if self.pretty {
			serde_json::to_writer_pretty(&mut file, model)?;
		} else {
			serde_json::to_writer(&mut file, model)?;
		}
		file.write_all(b"\n").map_err(|error| io_error(file.path(), error))?;
		file.as_file().sync_all().map_err(|error| io_error(file.path(), error))?;
		file.persist(&self.path).map_err(|error| io_error(&self.path, error.error))?;
		tracing::trace!(path = %self.path.display(), "model persisted");
		Ok(())
	}

	fn load(&self) -> Result<Option<ModelNode>, PersistenceError> {
		match fs::read(&self.path) {
			Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
			Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(error) => Err(io_error(&self.path, error)),
		}
	}
}

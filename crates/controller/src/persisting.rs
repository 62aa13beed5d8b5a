//! Persist-on-success decoration of a caller's result handler.
//!
//! # Invariants
//!
//! - Callbacks are forwarded in the order received.
//! - The caller observes `complete` before the model is stored.
//! - The model is stored at most once per operation, and only after completion.
//! - A store failure is logged and never reaches the caller.
//! - At most one terminal callback reaches the caller; later ones are dropped.
//! - A completion reported from inside a model closure stores once the calling
//!   thread has left that closure.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use steward_model::{ModelNode, SharedModel};

use crate::failure::FailureDescription;
use crate::persister::ConfigurationPersister;
use crate::result::{ResultHandler, TerminalState};

/// Writes the model back to its persister after successful operations.
///
/// Stores are serialized and each one snapshots the model after acquiring the
/// store lock, so the last store always carries every mutation that completed
/// before it. Operations themselves are not blocked by a running store.
pub struct PersistenceTrigger {
	model: SharedModel,
	persister: Arc<dyn ConfigurationPersister>,
	store_lock: Mutex<()>,
}

impl fmt::Debug for PersistenceTrigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PersistenceTrigger").finish_non_exhaustive()
	}
}

impl PersistenceTrigger {
	pub fn new(model: SharedModel, persister: Arc<dyn ConfigurationPersister>) -> Self {
		Self {
			model,
			persister,
			store_lock: Mutex::new(()),
		}
	}

	/// Stores the current model, logging any failure.
	pub fn persist(&self) {
		let _store = self.store_lock.lock();
		let snapshot = self.model.snapshot();
		if let Err(error) = self.persister.store(&snapshot) {
			tracing::warn!(%error, "failed to persist configuration change");
		}
	}
}

/// Result handler that forwards to the caller and persists on completion.
pub struct PersistingResultHandler {
	delegate: Arc<dyn ResultHandler>,
	trigger: Arc<PersistenceTrigger>,
	terminal: TerminalState,
}

impl PersistingResultHandler {
	pub fn new(delegate: Arc<dyn ResultHandler>, trigger: Arc<PersistenceTrigger>) -> Self {
		Self {
			delegate,
			trigger,
			terminal: TerminalState::new(),
		}
	}
}

impl ResultHandler for PersistingResultHandler {
	fn handle_result_fragment(&self, location: &[String], result: ModelNode) {
		if self.terminal.is_terminated() {
			tracing::warn!(?location, "result fragment after terminal outcome dropped");
			return;
		}
		self.delegate.handle_result_fragment(location, result);
	}

	fn handle_result_complete(&self, compensating_operation: ModelNode) {
		if !self.terminal.try_terminate("complete") {
			return;
		}
		self.delegate.handle_result_complete(compensating_operation);
		let trigger = Arc::clone(&self.trigger);
		self.trigger.model.run_unlocked(move || trigger.persist());
	}

	fn handle_failed(&self, failure: FailureDescription) {
		if self.terminal.try_terminate("failed") {
			self.delegate.handle_failed(failure);
		}
	}

	fn handle_cancellation(&self) {
		if self.terminal.try_terminate("cancellation") {
			self.delegate.handle_cancellation();
		}
	}
}

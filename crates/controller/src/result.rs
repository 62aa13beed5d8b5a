//! The result protocol between handlers and callers.
//!
//! A handler reports zero or more fragments followed by exactly one terminal
//! callback: [`ResultHandler::handle_result_complete`], [`ResultHandler::handle_failed`]
//! or [`ResultHandler::handle_cancellation`]. Callbacks for one operation are
//! sequential but may arrive on any thread.

use std::sync::atomic::{AtomicBool, Ordering};

use steward_model::ModelNode;

use crate::failure::FailureDescription;

/// Receiver of one operation's results.
pub trait ResultHandler: Send + Sync {
	/// Delivers a partial result to be stored at `location` within the overall result.
	fn handle_result_fragment(&self, location: &[String], result: ModelNode);

	/// The operation completed. `compensating_operation` describes how to undo it
	/// and is `null` when there is nothing to undo.
	fn handle_result_complete(&self, compensating_operation: ModelNode);

	/// The operation failed.
	fn handle_failed(&self, failure: FailureDescription);

	/// The operation was cancelled.
	fn handle_cancellation(&self);
}

/// Once-only terminal flag for one operation.
#[derive(Debug, Default)]
pub struct TerminalState {
	done: AtomicBool,
}

impl TerminalState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_terminated(&self) -> bool {
		self.done.load(Ordering::Acquire)
	}

	/// Records the terminal transition for `callback`.
	///
	/// Returns false if a terminal callback was already recorded; the late
	/// callback must then be dropped.
	pub fn try_terminate(&self, callback: &'static str) -> bool {
		if self.done.swap(true, Ordering::AcqRel) {
			tracing::warn!(callback, "result callback after terminal outcome dropped");
			return false;
		}
		true
	}
}

//! Blocking adapter over the asynchronous result protocol.
//!
//! # Invariants
//!
//! - The caller blocks on a condition private to the invocation.
//! - Only a terminal outcome ends the wait; a partially aggregated result is
//!   never returned.
//! - An interrupt during the wait requests cancellation and the wait goes on.
//!   The interrupt is restored on the calling thread before returning.
//! - `cancel` is never called while holding the invocation lock, so handlers may
//!   report cancellation synchronously from inside it.

use std::mem;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use steward_model::{ModelNode, set_at};

use crate::controller::ModelController;
use crate::error::SyncExecutionError;
use crate::failure::FailureDescription;
use crate::interrupt::{self, Interrupter};
use crate::result::ResultHandler;

#[derive(Debug, Default)]
enum Status {
	#[default]
	Pending,
	Completed,
	Cancelled,
	Failed(FailureDescription),
}

#[derive(Debug, Default)]
struct SyncState {
	status: Status,
	result: ModelNode,
}

impl SyncState {
	fn take_outcome(&mut self) -> Option<Result<ModelNode, SyncExecutionError>> {
		match &self.status {
			Status::Pending => None,
			Status::Completed => Some(Ok(mem::take(&mut self.result))),
			Status::Cancelled => Some(Err(SyncExecutionError::Cancelled)),
			Status::Failed(failure) => Some(Err(SyncExecutionError::OperationFailed(failure.clone()))),
		}
	}
}

/// Aggregates fragments and records the terminal status for one blocking call.
#[derive(Debug, Default)]
struct SyncResultHandler {
	state: Mutex<SyncState>,
	terminal: Condvar,
}

impl SyncResultHandler {
	fn finish(&self, status: Status) {
		let mut state = self.state.lock();
		if matches!(state.status, Status::Pending) {
			state.status = status;
		}
		self.terminal.notify_all();
	}

	fn wake(&self) {
		let _state = self.state.lock();
		self.terminal.notify_all();
	}
}

impl ResultHandler for SyncResultHandler {
	fn handle_result_fragment(&self, location: &[String], result: ModelNode) {
		let mut state = self.state.lock();
		if matches!(state.status, Status::Pending) {
			set_at(&mut state.result, location, result);
		}
	}

	fn handle_result_complete(&self, _compensating_operation: ModelNode) {
		self.finish(Status::Completed);
	}

	fn handle_failed(&self, failure: FailureDescription) {
		self.finish(Status::Failed(failure));
	}

	fn handle_cancellation(&self) {
		self.finish(Status::Cancelled);
	}
}

/// Executes `operation` on `controller` and blocks until it reaches a terminal outcome.
///
/// Returns the fragments aggregated by location (`null` if there were none).
pub fn execute_sync<C>(controller: &C, operation: &ModelNode) -> Result<ModelNode, SyncExecutionError>
where
	C: ModelController + ?Sized,
{
	let sink = Arc::new(SyncResultHandler::default());
	let handle = controller.execute(operation, Arc::clone(&sink) as Arc<dyn ResultHandler>);

	let registration = Interrupter::current().register_waker({
		let sink = Arc::clone(&sink);
		Arc::new(move || sink.wake())
	});

	let mut interrupted = false;
	let outcome = loop {
		let mut state = sink.state.lock();
		if let Some(outcome) = state.take_outcome() {
			break outcome;
		}
		if interrupt::interrupted() {
			interrupted = true;
			drop(state);
			tracing::debug!("interrupted while waiting for operation outcome, requesting cancellation");
			handle.cancel();
			continue;
		}
		sink.terminal.wait(&mut state);
	};

	drop(registration);
	if interrupted {
		interrupt::set_interrupted();
	}
	outcome
}

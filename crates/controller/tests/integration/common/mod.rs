//! Common utilities for controller integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use serde_json::json;
use steward_controller::{ConfigurationPersister, FailureDescription, ModelNode, PersistenceError, ResultHandler};

pub const WAIT: Duration = Duration::from_secs(10);

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Builds the model form of an operation.
pub fn op(name: &str, address: &str) -> ModelNode {
	json!({"operation": name, "address": address})
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	Fragment(Vec<String>, ModelNode),
	Complete(ModelNode),
	Failed(FailureDescription),
	Cancelled,
	/// Emitted by [`CountingPersister`] sharing this recorder.
	Stored(ModelNode),
}

impl Event {
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Complete(_) | Self::Failed(_) | Self::Cancelled)
	}
}

/// Records every callback in arrival order.
#[derive(Debug, Default)]
pub struct Recorder {
	events: Mutex<Vec<Event>>,
	changed: Condvar,
}

impl Recorder {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn push(&self, event: Event) {
		self.events.lock().push(event);
		self.changed.notify_all();
	}

	pub fn events(&self) -> Vec<Event> {
		self.events.lock().clone()
	}

	pub fn terminal_count(&self) -> usize {
		self.events.lock().iter().filter(|event| event.is_terminal()).count()
	}

	/// Blocks until a terminal callback arrives and returns it.
	pub fn wait_terminal(&self) -> Event {
		let mut events = self.events.lock();
		loop {
			if let Some(event) = events.iter().find(|event| event.is_terminal()) {
				return event.clone();
			}
			assert!(!self.changed.wait_for(&mut events, WAIT).timed_out(), "no terminal callback within {WAIT:?}");
		}
	}

	/// Returns the single failure recorded, panicking on anything else.
	pub fn single_failure(&self) -> FailureDescription {
		match self.events().as_slice() {
			[Event::Failed(failure)] => failure.clone(),
			other => panic!("expected exactly one failure, got {other:?}"),
		}
	}
}

impl ResultHandler for Recorder {
	fn handle_result_fragment(&self, location: &[String], result: ModelNode) {
		self.push(Event::Fragment(location.to_vec(), result));
	}

	fn handle_result_complete(&self, compensating_operation: ModelNode) {
		self.push(Event::Complete(compensating_operation));
	}

	fn handle_failed(&self, failure: FailureDescription) {
		self.push(Event::Failed(failure));
	}

	fn handle_cancellation(&self) {
		self.push(Event::Cancelled);
	}
}

/// Persister counting stores and optionally failing them.
pub struct CountingPersister {
	pub stores: AtomicUsize,
	recorder: Option<Arc<Recorder>>,
	fail: bool,
}

impl CountingPersister {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			stores: AtomicUsize::new(0),
			recorder: None,
			fail: false,
		})
	}

	/// Also records each store into `recorder` so ordering can be checked.
	pub fn recording(recorder: &Arc<Recorder>, fail: bool) -> Arc<Self> {
		Arc::new(Self {
			stores: AtomicUsize::new(0),
			recorder: Some(Arc::clone(recorder)),
			fail,
		})
	}

	pub fn stores(&self) -> usize {
		self.stores.load(Ordering::SeqCst)
	}
}

impl ConfigurationPersister for CountingPersister {
	fn store(&self, model: &ModelNode) -> Result<(), PersistenceError> {
		self.stores.fetch_add(1, Ordering::SeqCst);
		if let Some(recorder) = &self.recorder {
			recorder.push(Event::Stored(model.clone()));
		}
		if self.fail {
			return Err(PersistenceError::Unavailable("disk full".into()));
		}
		Ok(())
	}

	fn load(&self) -> Result<Option<ModelNode>, PersistenceError> {
		Ok(None)
	}
}

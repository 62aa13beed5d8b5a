use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use pretty_assertions::assert_eq;
use serde_json::json;
use steward_controller::interrupt::{self, Interrupter};
use steward_controller::{
	BasicModelController, Cancellable, ModelController, ModelNode, OperationHandler, PANIC_KIND, PathAddress, SyncExecutionError, ThreadedHandler, execute_sync,
	handler_fn, null_cancellable,
};

use crate::common::{CountingPersister, init_tracing, op};

/// Handler emitting fragments at several locations before completing.
fn describe_handler() -> Arc<dyn OperationHandler> {
	handler_fn(|_, _, result| {
		result.handle_result_fragment(&["name".to_string()], json!("web"));
		result.handle_result_fragment(&["listener".to_string(), "port".to_string()], json!(8080));
		result.handle_result_fragment(&["listener".to_string(), "secure".to_string()], json!(false));
		result.handle_result_complete(ModelNode::Null);
		Ok(null_cancellable())
	})
}

#[test]
fn aggregates_fragments_by_location() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	controller.register_operation_handler(PathAddress::root(), "describe", describe_handler()).unwrap();

	let result = controller.execute_sync(&op("describe", "/")).unwrap();
	assert_eq!(result, json!({"name": "web", "listener": {"port": 8080, "secure": false}}));
}

#[test]
fn empty_location_replaces_whole_result() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	controller
		.register_operation_handler(
			PathAddress::root(),
			"read",
			handler_fn(|_, _, result| {
				result.handle_result_fragment(&["stale".to_string()], json!(1));
				result.handle_result_fragment(&[], json!([1, 2, 3]));
				result.handle_result_complete(ModelNode::Null);
				Ok(null_cancellable())
			}),
		)
		.unwrap();

	assert_eq!(controller.execute_sync(&op("read", "/")).unwrap(), json!([1, 2, 3]));
}

#[test]
fn no_fragments_yields_null() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	controller
		.register_operation_handler(
			PathAddress::root(),
			"noop",
			handler_fn(|_, _, result| {
				result.handle_result_complete(ModelNode::Null);
				Ok(null_cancellable())
			}),
		)
		.unwrap();

	assert_eq!(execute_sync(&controller, &op("noop", "/")).unwrap(), ModelNode::Null);
}

#[test]
fn failure_is_returned_as_operation_failed() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	controller
		.register_operation_handler(PathAddress::root(), "fail", handler_fn(|_, _, _| Err(anyhow!("backend offline"))))
		.unwrap();

	let Err(SyncExecutionError::OperationFailed(failure)) = controller.execute_sync(&op("fail", "/")) else {
		panic!("expected a failure");
	};
	assert_eq!(failure.causes()[0].message, "backend offline");

	let Err(SyncExecutionError::OperationFailed(failure)) = controller.execute_sync(&op("fail", "/absent=node")) else {
		panic!("expected a failure");
	};
	assert!(failure.causes()[0].kind.ends_with("ModelError"), "{failure}");
}

#[test]
fn cancellation_is_returned_as_cancelled() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	controller
		.register_operation_handler(
			PathAddress::root(),
			"abort",
			handler_fn(|_, _, result| {
				result.handle_result_fragment(&["partial".to_string()], json!(true));
				result.handle_cancellation();
				Ok(null_cancellable())
			}),
		)
		.unwrap();

	assert_eq!(controller.execute_sync(&op("abort", "/")), Err(SyncExecutionError::Cancelled));
}

#[test]
fn waits_for_asynchronous_completion() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	let worker = ThreadedHandler::new("slow-read", |_, _, _, result| {
		thread::sleep(Duration::from_millis(50));
		result.handle_result_fragment(&["ready".to_string()], json!(true));
		Ok(Some(ModelNode::Null))
	});
	controller.register_operation_handler(PathAddress::root(), "slow-read", Arc::new(worker)).unwrap();

	assert_eq!(controller.execute_sync(&op("slow-read", "/")).unwrap(), json!({"ready": true}));
}

#[test]
fn worker_panic_is_returned_as_failure() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	let worker = ThreadedHandler::new("explode", |_, _, _, _| panic!("worker blew up"));
	controller.register_operation_handler(PathAddress::root(), "explode", Arc::new(worker)).unwrap();

	let Err(SyncExecutionError::OperationFailed(failure)) = controller.execute_sync(&op("explode", "/")) else {
		panic!("expected a failure");
	};
	assert_eq!(failure.causes()[0].kind, PANIC_KIND);
	assert_eq!(failure.causes()[0].message, "worker blew up");
}

/// Cancellable that counts requests and reports cancellation on the first one.
struct CancelOnRequest {
	requests: AtomicUsize,
	result: Arc<dyn steward_controller::ResultHandler>,
}

impl Cancellable for CancelOnRequest {
	fn cancel(&self) -> bool {
		let first = self.requests.fetch_add(1, Ordering::SeqCst) == 0;
		if first {
			self.result.handle_cancellation();
		}
		first
	}
}

#[test]
fn interrupt_requests_cancellation_and_is_restored() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	let handles = Arc::new(parking_lot::Mutex::new(Vec::<Arc<CancelOnRequest>>::new()));
	controller
		.register_operation_handler(PathAddress::root(), "hang", {
			let handles = Arc::clone(&handles);
			handler_fn(move |_, _, result| {
				let handle = Arc::new(CancelOnRequest {
					requests: AtomicUsize::new(0),
					result,
				});
				handles.lock().push(Arc::clone(&handle));
				Ok(handle as Arc<dyn Cancellable>)
			})
		})
		.unwrap();

	let interrupter = Interrupter::current();
	let trigger = thread::spawn(move || {
		thread::sleep(Duration::from_millis(50));
		interrupter.interrupt();
	});

	let outcome = controller.execute_sync(&op("hang", "/"));
	trigger.join().unwrap();

	assert_eq!(outcome, Err(SyncExecutionError::Cancelled));
	assert_eq!(handles.lock()[0].requests.load(Ordering::SeqCst), 1);
	assert!(interrupt::interrupted(), "interrupt flag must be restored");
	assert!(!interrupt::is_interrupted());
}

#[test]
fn pending_interrupt_cancels_threaded_handler() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	let worker = ThreadedHandler::new("wait-forever", |_, _, token, _| {
		while !token.is_cancelled() {
			thread::sleep(Duration::from_millis(5));
		}
		Ok(None)
	});
	controller.register_operation_handler(PathAddress::root(), "wait", Arc::new(worker)).unwrap();

	interrupt::set_interrupted();
	let outcome = controller.execute_sync(&op("wait", "/"));

	assert_eq!(outcome, Err(SyncExecutionError::Cancelled));
	assert!(interrupt::interrupted());
}

#[test]
fn interrupt_keeps_waiting_for_late_completion() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	let worker = ThreadedHandler::new("stubborn", |_, _, token, result| {
		thread::sleep(Duration::from_millis(200));
		result.handle_result_fragment(&["cancel-seen".to_string()], json!(token.is_cancelled()));
		Ok(Some(ModelNode::Null))
	});
	controller.register_operation_handler(PathAddress::root(), "stubborn", Arc::new(worker)).unwrap();

	let interrupter = Interrupter::current();
	let trigger = thread::spawn(move || {
		thread::sleep(Duration::from_millis(30));
		interrupter.interrupt();
	});

	let outcome = controller.execute_sync(&op("stubborn", "/"));
	trigger.join().unwrap();

	assert_eq!(outcome, Ok(json!({"cancel-seen": true})));
	assert!(interrupt::interrupted(), "interrupt flag must be restored");
}

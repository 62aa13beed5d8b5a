use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use pretty_assertions::assert_eq;
use serde_json::json;
use steward_controller::{BasicModelController, Cancellable, ModelController, PathAddress, ThreadedHandler, is_null_cancellable};

use crate::common::{CountingPersister, Event, Recorder, init_tracing, op};

#[test]
fn body_runs_on_named_thread_and_completes_later() {
	init_tracing();
	let persister = CountingPersister::new();
	let controller = BasicModelController::new(persister.clone());
	let worker = ThreadedHandler::new("whoami", |_, _, _, result| {
		let name = thread::current().name().map(str::to_string);
		result.handle_result_fragment(&[], json!(name));
		Ok(Some(json!({"operation": "noop"})))
	});
	controller.register_operation_handler(PathAddress::root(), "whoami", Arc::new(worker)).unwrap();

	let recorder = Recorder::new();
	let handle = controller.execute(&op("whoami", "/"), recorder.clone());

	assert!(!is_null_cancellable(&handle));
	assert_eq!(recorder.wait_terminal(), Event::Complete(json!({"operation": "noop"})));
	assert_eq!(recorder.events()[0], Event::Fragment(vec![], json!("steward-op-whoami")));
}

#[test]
fn cancel_handle_reaches_the_body() {
	init_tracing();
	let persister = CountingPersister::new();
	let controller = BasicModelController::new(persister.clone());
	let worker = ThreadedHandler::new("wait", |_, _, token, _| {
		while !token.is_cancelled() {
			thread::sleep(Duration::from_millis(5));
		}
		Ok(None)
	});
	controller.register_operation_handler(PathAddress::root(), "wait", Arc::new(worker)).unwrap();

	let recorder = Recorder::new();
	let handle = controller.execute(&op("wait", "/"), recorder.clone());
	assert!(handle.cancel());
	assert!(!handle.cancel());

	assert_eq!(recorder.wait_terminal(), Event::Cancelled);
	assert_eq!(recorder.terminal_count(), 1);
	assert_eq!(persister.stores(), 0);
}

#[test]
fn body_error_is_reported_as_failure() {
	init_tracing();
	let controller = BasicModelController::new(CountingPersister::new());
	let worker = ThreadedHandler::new("fail", |_, _, _, _| Err(anyhow!("upstream timed out")));
	controller.register_operation_handler(PathAddress::root(), "fail", Arc::new(worker)).unwrap();

	let recorder = Recorder::new();
	controller.execute(&op("fail", "/"), recorder.clone());

	let Event::Failed(failure) = recorder.wait_terminal() else {
		panic!("expected a failure, got {:?}", recorder.events());
	};
	assert_eq!(failure.causes()[0].message, "upstream timed out");
}

#[test]
fn body_sees_context_mutations_of_the_shared_model() {
	init_tracing();
	let controller = BasicModelController::builder().initial_model(json!({"counter": {"hits": {"value": 0}}})).build();
	let worker = ThreadedHandler::new("increment", |ctx, _, _, _| {
		let next = ctx.update(|node| {
			let next = node["value"].as_i64().unwrap_or(0) + 1;
			node["value"] = json!(next);
			next
		})?;
		Ok(Some(json!({"operation": "decrement", "value": next})))
	});
	controller.register_operation_handler("/counter=*".parse().unwrap(), "increment", Arc::new(worker)).unwrap();

	for expected in 1..=3 {
		let recorder = Recorder::new();
		controller.execute(&op("increment", "/counter=hits"), recorder.clone());
		assert_eq!(recorder.wait_terminal(), Event::Complete(json!({"operation": "decrement", "value": expected})));
	}
	assert_eq!(controller.model().sub_model(&"/counter=hits".parse().unwrap()).unwrap(), json!({"value": 3}));
	assert!(controller.execute_sync(&op("increment", "/counter=missing")).is_err());
}

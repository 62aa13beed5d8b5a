//! Handlers whose work runs on a dedicated worker thread.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use anyhow::Context as _;
use steward_model::{ModelNode, Operation};
use tokio_util::sync::CancellationToken;

use crate::cancel::Cancellable;
use crate::context::OperationContext;
use crate::failure::FailureDescription;
use crate::handler::OperationHandler;
use crate::result::ResultHandler;

type Body = dyn Fn(&OperationContext, &Operation, &CancellationToken, &dyn ResultHandler) -> anyhow::Result<Option<ModelNode>> + Send + Sync;

/// Runs a blocking handler body on its own named thread.
///
/// `execute` returns as soon as the thread is started, handing back the body's
/// [`CancellationToken`] as the cancellation handle. The body may emit
/// fragments through the result handler it is given, and decides the terminal
/// outcome by its return value:
///
/// * `Ok(Some(compensating_operation))`: completed,
/// * `Ok(None)`: cancelled (the body observed the token),
/// * `Err(_)`: failed, reported with the error's cause chain.
///
/// A panicking body is reported as a failure of kind [`PANIC_KIND`](crate::PANIC_KIND).
#[derive(Clone)]
pub struct ThreadedHandler {
	name: String,
	body: Arc<Body>,
}

impl fmt::Debug for ThreadedHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ThreadedHandler").field("name", &self.name).finish_non_exhaustive()
	}
}

impl ThreadedHandler {
	/// Creates a handler whose worker threads are named after `name`.
	pub fn new<F>(name: impl Into<String>, body: F) -> Self
	where
		F: Fn(&OperationContext, &Operation, &CancellationToken, &dyn ResultHandler) -> anyhow::Result<Option<ModelNode>> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			body: Arc::new(body),
		}
	}
}

impl OperationHandler for ThreadedHandler {
	fn execute(&self, context: OperationContext, operation: &Operation, result_handler: Arc<dyn ResultHandler>) -> anyhow::Result<Arc<dyn Cancellable>> {
		let token = CancellationToken::new();
		let body = Arc::clone(&self.body);
		let operation = operation.clone();
		let worker_token = token.clone();
		let thread_name = format!("steward-op-{}", self.name);

		tracing::trace!(thread = %thread_name, operation = %operation.describe(), "worker.spawn_named_thread");
		thread::Builder::new()
			.name(thread_name)
			.spawn(move || {
				let run = panic::catch_unwind(AssertUnwindSafe(|| body(&context, &operation, &worker_token, result_handler.as_ref())));
				match run {
					Ok(Ok(Some(compensating_operation))) => result_handler.handle_result_complete(compensating_operation),
					Ok(Ok(None)) => result_handler.handle_cancellation(),
					Ok(Err(error)) => result_handler.handle_failed(FailureDescription::from_anyhow(&error)),
					Err(payload) => result_handler.handle_failed(FailureDescription::from_panic(payload.as_ref())),
				}
			})
			.context("failed to spawn operation worker thread")?;

		Ok(Arc::new(token))
	}
}

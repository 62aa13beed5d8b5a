use std::sync::Arc;

use steward_model::Operation;

use crate::cancel::Cancellable;
use crate::context::OperationContext;
use crate::result::ResultHandler;

/// Logic registered to execute operations at an address.
///
/// `execute` may finish the operation before returning or hand the result
/// handler to other threads and report later. Returning an error means nothing
/// was reported and nothing is running; the controller reports the failure.
pub trait OperationHandler: Send + Sync {
	fn execute(&self, context: OperationContext, operation: &Operation, result_handler: Arc<dyn ResultHandler>) -> anyhow::Result<Arc<dyn Cancellable>>;
}

impl<F> OperationHandler for F
where
	F: Fn(OperationContext, &Operation, Arc<dyn ResultHandler>) -> anyhow::Result<Arc<dyn Cancellable>> + Send + Sync,
{
	fn execute(&self, context: OperationContext, operation: &Operation, result_handler: Arc<dyn ResultHandler>) -> anyhow::Result<Arc<dyn Cancellable>> {
		self(context, operation, result_handler)
	}
}

/// Wraps a closure as a shareable handler.
pub fn handler_fn<F>(f: F) -> Arc<dyn OperationHandler>
where
	F: Fn(OperationContext, &Operation, Arc<dyn ResultHandler>) -> anyhow::Result<Arc<dyn Cancellable>> + Send + Sync + 'static,
{
	Arc::new(f)
}

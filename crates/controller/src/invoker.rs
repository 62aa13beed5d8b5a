use std::sync::Arc;

use steward_model::Operation;

use crate::cancel::Cancellable;
use crate::context::OperationContext;
use crate::handler::OperationHandler;
use crate::result::ResultHandler;

/// Strategy for running a resolved handler.
///
/// Controller variants substitute this to wrap invocation (auditing, admission
/// control) without changing dispatch.
pub trait HandlerInvoker: Send + Sync {
	fn invoke(
		&self,
		context: OperationContext,
		operation: &Operation,
		handler: &dyn OperationHandler,
		result_handler: Arc<dyn ResultHandler>,
	) -> anyhow::Result<Arc<dyn Cancellable>>;
}

/// Calls the handler directly on the dispatching thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectInvoker;

impl HandlerInvoker for DirectInvoker {
	fn invoke(
		&self,
		context: OperationContext,
		operation: &Operation,
		handler: &dyn OperationHandler,
		result_handler: Arc<dyn ResultHandler>,
	) -> anyhow::Result<Arc<dyn Cancellable>> {
		handler.execute(context, operation, result_handler)
	}
}

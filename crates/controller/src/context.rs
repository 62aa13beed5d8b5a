//! Execution contexts handed to operation handlers.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;
use steward_model::{ModelNode, Operation, PathAddress, Result, SharedModel};

use crate::handler::OperationHandler;

/// One operation's view of the model.
///
/// The context stays valid for the whole asynchronous execution; handlers may
/// move it to worker threads. All access goes through the shared model's lock
/// and re-navigates from the root, so a node removed by a concurrent operation
/// is reported as [`ModelError::NotFound`](steward_model::ModelError::NotFound).
#[derive(Clone)]
pub struct OperationContext {
	model: SharedModel,
	address: PathAddress,
	attachments: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for OperationContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OperationContext")
			.field("address", &self.address)
			.field("attachments", &self.attachments.len())
			.finish_non_exhaustive()
	}
}

impl OperationContext {
	pub fn new(model: SharedModel, address: PathAddress) -> Self {
		Self {
			model,
			address,
			attachments: HashMap::default(),
		}
	}

	/// Address of the affected sub-model.
	pub fn address(&self) -> &PathAddress {
		&self.address
	}

	/// The whole shared model.
	pub fn model(&self) -> &SharedModel {
		&self.model
	}

	/// Returns a copy of the affected sub-model.
	pub fn sub_model(&self) -> Result<ModelNode> {
		self.model.sub_model(&self.address)
	}

	/// Runs `f` against the affected sub-model under the read lock.
	pub fn read<R>(&self, f: impl FnOnce(&ModelNode) -> R) -> Result<R> {
		self.model.read_at(&self.address, f)
	}

	/// Runs `f` against the affected sub-model under the write lock.
	///
	/// `f` may report the outcome through the result handler; a completion
	/// reported inside `f` is persisted once `f` returns.
	pub fn update<R>(&self, f: impl FnOnce(&mut ModelNode) -> R) -> Result<R> {
		self.model.write_at(&self.address, f)
	}

	/// Stores a typed value for the handler, replacing any value of the same type.
	pub fn insert_attachment<T: Any + Send + Sync>(&mut self, value: T) {
		self.attachments.insert(TypeId::of::<T>(), Arc::new(value));
	}

	pub fn attachment<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		let value = self.attachments.get(&TypeId::of::<T>())?;
		Arc::clone(value).downcast::<T>().ok()
	}
}

/// Builds the context for one dispatch.
pub trait OperationContextFactory: Send + Sync {
	fn create_context(&self, model: &SharedModel, operation: &Operation, handler: &Arc<dyn OperationHandler>) -> anyhow::Result<OperationContext>;
}

/// Scopes the context to the operation address and attaches nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicContextFactory;

impl OperationContextFactory for BasicContextFactory {
	fn create_context(&self, model: &SharedModel, operation: &Operation, _handler: &Arc<dyn OperationHandler>) -> anyhow::Result<OperationContext> {
		Ok(OperationContext::new(Arc::clone(model), operation.address().clone()))
	}
}

//! Operation dispatch.
//!
//! # Invariants
//!
//! - Every dispatch failure is reported through the caller's result handler as
//!   exactly one `handle_failed`, and `execute` then returns the null handle.
//! - Only the configured creation operation may create its address, and only
//!   once a handler for it has been found.
//! - Handlers always see the persisting decorator, never the caller's handler.
//! - `execute` never unwinds into the caller; panics during setup or synchronous
//!   handler execution become failures of kind `panic`.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use steward_handler_registry::{OperationRegistry, RegistryError};
use steward_model::{Model, ModelNode, Operation, PathAddress, SharedModel};

use crate::cancel::{Cancellable, null_cancellable};
use crate::config::ControllerConfig;
use crate::context::{BasicContextFactory, OperationContextFactory};
use crate::error::{DispatchError, PersistenceError, SyncExecutionError};
use crate::failure::panic_message;
use crate::handler::OperationHandler;
use crate::invoker::{DirectInvoker, HandlerInvoker};
use crate::persister::{ConfigurationPersister, JsonFilePersister, NullConfigurationPersister};
use crate::persisting::{PersistenceTrigger, PersistingResultHandler};
use crate::result::ResultHandler;

/// Entry point for executing management operations.
pub trait ModelController: Send + Sync {
	/// Executes `operation`, reporting its outcome through `handler`.
	///
	/// Returns a handle to request cancellation. The operation may still be
	/// running when this returns.
	fn execute(&self, operation: &ModelNode, handler: Arc<dyn ResultHandler>) -> Arc<dyn Cancellable>;

	/// Executes `operation` and blocks until its terminal outcome.
	fn execute_sync(&self, operation: &ModelNode) -> Result<ModelNode, SyncExecutionError> {
		crate::sync::execute_sync(self, operation)
	}

	/// Registers `handler` for `name` at every address matching `pattern`.
	fn register_operation_handler(&self, pattern: PathAddress, name: &str, handler: Arc<dyn OperationHandler>) -> Result<Option<Arc<dyn OperationHandler>>, RegistryError>;
}

/// Controller over one shared model, one registry and one persister.
pub struct BasicModelController {
	model: SharedModel,
	registry: OperationRegistry<dyn OperationHandler>,
	trigger: Arc<PersistenceTrigger>,
	context_factory: Arc<dyn OperationContextFactory>,
	invoker: Arc<dyn HandlerInvoker>,
	config: ControllerConfig,
}

impl fmt::Debug for BasicModelController {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BasicModelController")
			.field("registry", &self.registry)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl BasicModelController {
	/// Creates a controller over an empty model with default collaborators.
	pub fn new(persister: Arc<dyn ConfigurationPersister>) -> Self {
		ModelControllerBuilder::default().persister(persister).build()
	}

	pub fn builder() -> ModelControllerBuilder {
		ModelControllerBuilder::default()
	}

	/// Boots a controller from configuration.
	///
	/// With a persistence path set, the model is loaded from that file when it
	/// exists and written back to it after each successful operation.
	pub fn from_config(config: &ControllerConfig) -> Result<Self, PersistenceError> {
		let mut builder = ModelControllerBuilder::default().config(config.clone());
		if let Some(path) = &config.persistence.path {
			let persister = JsonFilePersister::new(path).pretty(config.persistence.pretty);
			if let Some(model) = persister.load()? {
				tracing::debug!(path = %path.display(), "initial model loaded");
				builder = builder.initial_model(model);
			}
			builder = builder.persister(Arc::new(persister));
		}
		Ok(builder.build())
	}

	/// The shared model this controller operates on.
	pub fn model(&self) -> &SharedModel {
		&self.model
	}

	pub fn config(&self) -> &ControllerConfig {
		&self.config
	}

	/// Sorted names of the operations resolvable at `address`.
	pub fn operation_names(&self, address: &PathAddress) -> Vec<String> {
		self.registry.operation_names(address)
	}

	fn dispatch(&self, operation: &ModelNode, result_handler: &Arc<dyn ResultHandler>) -> Result<Arc<dyn Cancellable>, DispatchError> {
		let operation = Operation::from_model(operation)?;
		let address = operation.address();
		let create = operation.name() == self.config.creation_operation;
		if !create {
			self.model.resolve(address, false)?;
		}

		let handler = self.registry.lookup(address, operation.name()).ok_or_else(|| DispatchError::NoHandler {
			address: address.to_string(),
			name: operation.name().to_string(),
		})?;
		// Nothing is created for an operation without a handler.
		if create {
			self.model.resolve(address, true)?;
		}

		let context = self
			.context_factory
			.create_context(&self.model, &operation, &handler)
			.map_err(DispatchError::Context)?;

		tracing::trace!(operation = %operation.describe(), "dispatching operation");
		self.invoker
			.invoke(context, &operation, handler.as_ref(), Arc::clone(result_handler))
			.map_err(DispatchError::Handler)
	}
}

impl ModelController for BasicModelController {
	fn execute(&self, operation: &ModelNode, handler: Arc<dyn ResultHandler>) -> Arc<dyn Cancellable> {
		let sink: Arc<dyn ResultHandler> = Arc::new(PersistingResultHandler::new(handler, Arc::clone(&self.trigger)));

		let dispatched = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(operation, &sink)))
			.unwrap_or_else(|payload| Err(DispatchError::Panic(panic_message(payload.as_ref()))));

		match dispatched {
			Ok(handle) => handle,
			Err(error) => {
				tracing::debug!(%error, "operation dispatch failed");
				sink.handle_failed(error.failure_description());
				null_cancellable()
			}
		}
	}

	fn register_operation_handler(&self, pattern: PathAddress, name: &str, handler: Arc<dyn OperationHandler>) -> Result<Option<Arc<dyn OperationHandler>>, RegistryError> {
		self.registry.register(pattern, name, handler)
	}
}

/// Assembles a [`BasicModelController`] with substituted collaborators.
#[derive(Default)]
pub struct ModelControllerBuilder {
	persister: Option<Arc<dyn ConfigurationPersister>>,
	context_factory: Option<Arc<dyn OperationContextFactory>>,
	invoker: Option<Arc<dyn HandlerInvoker>>,
	config: ControllerConfig,
	initial_model: Option<ModelNode>,
}

impl fmt::Debug for ModelControllerBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ModelControllerBuilder").field("config", &self.config).finish_non_exhaustive()
	}
}

impl ModelControllerBuilder {
	#[must_use]
	pub fn persister(mut self, persister: Arc<dyn ConfigurationPersister>) -> Self {
		self.persister = Some(persister);
		self
	}

	#[must_use]
	pub fn context_factory(mut self, factory: Arc<dyn OperationContextFactory>) -> Self {
		self.context_factory = Some(factory);
		self
	}

	#[must_use]
	pub fn invoker(mut self, invoker: Arc<dyn HandlerInvoker>) -> Self {
		self.invoker = Some(invoker);
		self
	}

	#[must_use]
	pub fn config(mut self, config: ControllerConfig) -> Self {
		self.config = config;
		self
	}

	/// Starts the controller from `model` instead of an empty composite.
	#[must_use]
	pub fn initial_model(mut self, model: ModelNode) -> Self {
		self.initial_model = Some(model);
		self
	}

	pub fn build(self) -> BasicModelController {
		let model: SharedModel = Arc::new(match self.initial_model {
			Some(root) => Model::with_root(root),
			None => Model::new(),
		});
		let persister = self.persister.unwrap_or_else(|| Arc::new(NullConfigurationPersister));

		BasicModelController {
			registry: OperationRegistry::with_policy(self.config.duplicate_policy),
			trigger: Arc::new(PersistenceTrigger::new(Arc::clone(&model), persister)),
			context_factory: self.context_factory.unwrap_or_else(|| Arc::new(BasicContextFactory)),
			invoker: self.invoker.unwrap_or_else(|| Arc::new(DirectInvoker)),
			model,
			config: self.config,
		}
	}
}

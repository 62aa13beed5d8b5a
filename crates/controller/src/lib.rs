//! Execution core of the Steward management controller.
//!
//! A [`ModelController`] accepts operations addressed against the configuration
//! model, finds the registered [`OperationHandler`] for the address and name, runs
//! it, and reports results through the [`ResultHandler`] protocol: zero or more
//! fragments followed by exactly one terminal callback. Successful completions
//! persist the model through a [`ConfigurationPersister`].
//!
//! * `execute`: asynchronous entry point returning a [`Cancellable`].
//! * `execute_sync`: blocking adapter aggregating fragments into one result.
//! * [`ThreadedHandler`]: runs a blocking handler body on its own worker thread.
//! * [`interrupt`]: per-thread interrupt flags honored by `execute_sync`.

mod cancel;
mod config;
mod context;
mod controller;
mod error;
mod failure;
mod handler;
pub mod interrupt;
mod invoker;
mod persister;
mod persisting;
mod result;
mod sync;
mod worker;

pub use cancel::{Cancellable, NullCancellable, is_null_cancellable, null_cancellable};
pub use config::{ControllerConfig, PersistenceConfig};
pub use context::{BasicContextFactory, OperationContext, OperationContextFactory};
pub use controller::{BasicModelController, ModelController, ModelControllerBuilder};
pub use error::{ConfigError, DispatchError, PersistenceError, SyncExecutionError};
pub use failure::{FailureCause, FailureDescription, KindedError, PANIC_KIND};
pub use handler::{OperationHandler, handler_fn};
pub use interrupt::Interrupter;
pub use invoker::{DirectInvoker, HandlerInvoker};
pub use persister::{ConfigurationPersister, JsonFilePersister, NullConfigurationPersister};
pub use persisting::{PersistenceTrigger, PersistingResultHandler};
pub use result::{ResultHandler, TerminalState};
pub use steward_handler_registry::{DuplicatePolicy, RegistryError};
pub use steward_model::{Model, ModelError, ModelNode, Operation, PathAddress, PathElement, SharedModel};
pub use sync::execute_sync;
pub use worker::ThreadedHandler;

//! Operation handler registry.
//!
//! Handlers are registered against an address pattern and an operation name. A
//! pattern is a [`PathAddress`](steward_model::PathAddress) whose element values
//! may be the wildcard `*`; lookups use concrete operation addresses.

mod error;
mod policy;
mod registry;

pub use error::{RegistryError, Result};
pub use policy::DuplicatePolicy;
pub use registry::OperationRegistry;

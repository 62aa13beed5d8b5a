//! Hierarchical configuration model for the Steward controller.
//!
//! The model is a single ordered tree of named nodes ([`ModelNode`]) owned by one
//! controller. Locations inside the tree are named by a [`PathAddress`], an
//! ordered list of `key=value` [`PathElement`]s, and requests against the tree are
//! described by an [`Operation`].
//!
//! Every path element descends two levels of the tree: the address
//! `/subsystem=web/connector=http` names `root["subsystem"]["web"]["connector"]["http"]`.

mod address;
mod error;
mod node;
mod operation;
mod tree;

pub use address::{PathAddress, PathElement, WILDCARD};
pub use error::{ModelError, Result};
pub use node::{ModelNode, empty_composite, is_composite, set_at};
pub use operation::{ADD, ADDRESS, OPERATION, Operation};
pub use tree::{Model, SharedModel};

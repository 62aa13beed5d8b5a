//! The shared, lock-guarded model tree.
//!
//! # Invariants
//!
//! - The whole tree sits behind one reader/writer lock. Every read or write of
//!   any node is serialized against writers, so concurrently running handlers
//!   never observe a half-applied closure.
//! - The lock is never held while calling out to code that does not belong to
//!   the closure passed in by the caller.
//! - Work handed to [`Model::run_unlocked`] never runs while the calling thread
//!   is inside a `read` or `write` closure of the same model.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::address::PathAddress;
use crate::error::Result;
use crate::node::{ModelNode, empty_composite};

/// Shared handle to a controller's model.
pub type SharedModel = Arc<Model>;

/// The configuration tree owned by one controller.
#[derive(Debug)]
pub struct Model {
	root: RwLock<ModelNode>,
}

impl Default for Model {
	fn default() -> Self {
		Self::new()
	}
}

impl Model {
	/// Creates a model whose root is an empty composite node.
	pub fn new() -> Self {
		Self::with_root(empty_composite())
	}

	pub fn with_root(root: ModelNode) -> Self {
		Self { root: RwLock::new(root) }
	}

	/// Runs `f` against the root under the read lock.
	pub fn read<R>(&self, f: impl FnOnce(&ModelNode) -> R) -> R {
		let _scope = LockScope::enter(self);
		let root = self.root.read();
		f(&root)
	}

	/// Runs `f` against the root under the write lock.
	pub fn write<R>(&self, f: impl FnOnce(&mut ModelNode) -> R) -> R {
		let _scope = LockScope::enter(self);
		let mut root = self.root.write();
		f(&mut root)
	}

	/// Returns true if the calling thread is inside a `read` or `write` closure of this model.
	pub fn is_locked_by_current_thread(&self) -> bool {
		SCOPES.with(|scopes| scopes.borrow().iter().any(|scope| scope.model == self.id()))
	}

	/// Runs `action` now, or after the calling thread leaves its outermost
	/// `read` or `write` closure of this model.
	///
	/// Taking the lock again from inside such a closure would never return;
	/// actions that need the lock (such as storing a snapshot) go through here.
	/// A deferred action is dropped if its closure unwinds.
	pub fn run_unlocked(&self, action: impl FnOnce() + 'static) {
		let id = self.id();
		let action = SCOPES.with(|scopes| {
			let mut scopes = scopes.borrow_mut();
			match scopes.iter_mut().find(|scope| scope.model == id) {
				Some(outermost) => {
					outermost.deferred.push(Box::new(action));
					None
				}
				None => Some(action),
			}
		});
		if let Some(action) = action {
			action();
		}
	}

	fn id(&self) -> usize {
		std::ptr::from_ref(self) as usize
	}

	/// Returns a deep copy of the whole tree.
	pub fn snapshot(&self) -> ModelNode {
		self.root.read().clone()
	}

	/// Checks that `address` resolves, creating missing nodes when `create` is set.
	///
	/// Creation takes the write lock; plain resolution only reads.
	pub fn resolve(&self, address: &PathAddress, create: bool) -> Result<()> {
		if create {
			self.write(|root| address.navigate_mut(root, true).map(|_| ()))
		} else {
			self.read(|root| address.navigate(root).map(|_| ()))
		}
	}

	/// Returns a deep copy of the node at `address`.
	pub fn sub_model(&self, address: &PathAddress) -> Result<ModelNode> {
		self.read(|root| address.navigate(root).cloned())
	}

	/// Runs `f` against the node at `address` under the read lock.
	pub fn read_at<R>(&self, address: &PathAddress, f: impl FnOnce(&ModelNode) -> R) -> Result<R> {
		self.read(|root| address.navigate(root).map(f))
	}

	/// Runs `f` against the node at `address` under the write lock.
	pub fn write_at<R>(&self, address: &PathAddress, f: impl FnOnce(&mut ModelNode) -> R) -> Result<R> {
		self.write(|root| address.navigate_mut(root, false).map(f))
	}
}

struct Scope {
	model: usize,
	deferred: Vec<Box<dyn FnOnce()>>,
}

thread_local! {
	static SCOPES: RefCell<Vec<Scope>> = const { RefCell::new(Vec::new()) };
}

/// Marks the calling thread as inside a lock closure of one model.
///
/// Declared before the lock guard so it drops after the lock is released.
struct LockScope;

impl LockScope {
	fn enter(model: &Model) -> Self {
		SCOPES.with(|scopes| {
			scopes.borrow_mut().push(Scope {
				model: model.id(),
				deferred: Vec::new(),
			});
		});
		Self
	}
}

impl Drop for LockScope {
	fn drop(&mut self) {
		let Some(scope) = SCOPES.with(|scopes| scopes.borrow_mut().pop()) else {
			return;
		};
		if scope.deferred.is_empty() {
			return;
		}
		if std::thread::panicking() {
			tracing::warn!(dropped = scope.deferred.len(), "model closure unwound, deferred actions dropped");
			return;
		}
		for action in scope.deferred {
			action();
		}
	}
}

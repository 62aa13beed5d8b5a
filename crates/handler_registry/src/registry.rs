//! Registry container with atomic snapshot publication.
//!
//! # Role
//!
//! Registration happens at setup time and lookups happen on every dispatch, so
//! the registry publishes immutable snapshots through an [`ArcSwap`]. Lookups
//! never lock; registrations copy the current snapshot and publish it with a
//! compare-and-swap loop.
//!
//! # Invariants
//!
//! - At most one handler per exact (pattern, name) key.
//! - Concurrent registrations are linearizable: no update is lost.
//! - Lookup is deterministic: among matching patterns the most specific wins,
//!   comparing elements left to right with exact values beating wildcards.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;
use steward_model::PathAddress;

use crate::error::{RegistryError, Result};
use crate::policy::DuplicatePolicy;

struct Registration<H: ?Sized> {
	pattern: PathAddress,
	handler: Arc<H>,
}

impl<H: ?Sized> Clone for Registration<H> {
	fn clone(&self) -> Self {
		Self {
			pattern: self.pattern.clone(),
			handler: Arc::clone(&self.handler),
		}
	}
}

struct Snapshot<H: ?Sized> {
	by_name: HashMap<String, Vec<Registration<H>>>,
}

impl<H: ?Sized> Default for Snapshot<H> {
	fn default() -> Self {
		Self { by_name: HashMap::default() }
	}
}

impl<H: ?Sized> Clone for Snapshot<H> {
	fn clone(&self) -> Self {
		Self {
			by_name: self.by_name.clone(),
		}
	}
}

/// Outcome of applying one registration to a snapshot copy.
enum Insert<H: ?Sized> {
	New,
	Replaced(Arc<H>),
	Rejected,
}

impl<H: ?Sized> Snapshot<H> {
	fn insert(&mut self, pattern: &PathAddress, name: &str, handler: &Arc<H>, policy: DuplicatePolicy) -> Insert<H> {
		let entries = self.by_name.entry(name.to_string()).or_default();
		match entries.iter_mut().find(|entry| entry.pattern == *pattern) {
			Some(_) if policy == DuplicatePolicy::Reject => Insert::Rejected,
			Some(entry) => Insert::Replaced(std::mem::replace(&mut entry.handler, Arc::clone(handler))),
			None => {
				entries.push(Registration {
					pattern: pattern.clone(),
					handler: Arc::clone(handler),
				});
				Insert::New
			}
		}
	}

	fn remove(&mut self, pattern: &PathAddress, name: &str) -> Option<Arc<H>> {
		let entries = self.by_name.get_mut(name)?;
		let idx = entries.iter().position(|entry| entry.pattern == *pattern)?;
		let removed = entries.remove(idx);
		if entries.is_empty() {
			self.by_name.remove(name);
		}
		Some(removed.handler)
	}
}

/// Handlers keyed by (address pattern, operation name).
pub struct OperationRegistry<H: ?Sized> {
	snap: ArcSwap<Snapshot<H>>,
	policy: DuplicatePolicy,
}

impl<H: ?Sized> Default for OperationRegistry<H> {
	fn default() -> Self {
		Self::new()
	}
}

impl<H: ?Sized> fmt::Debug for OperationRegistry<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OperationRegistry")
			.field("policy", &self.policy)
			.field("len", &self.len())
			.finish()
	}
}

impl<H: ?Sized> OperationRegistry<H> {
	/// Creates an empty registry that rejects duplicate registrations.
	pub fn new() -> Self {
		Self::with_policy(DuplicatePolicy::default())
	}

	pub fn with_policy(policy: DuplicatePolicy) -> Self {
		Self {
			snap: ArcSwap::from_pointee(Snapshot::default()),
			policy,
		}
	}

	pub fn policy(&self) -> DuplicatePolicy {
		self.policy
	}

	/// Registers `handler` for `name` at `pattern`.
	///
	/// Under [`DuplicatePolicy::LastWins`] the displaced handler is returned.
	pub fn register(&self, pattern: PathAddress, name: impl Into<String>, handler: Arc<H>) -> Result<Option<Arc<H>>> {
		let name = name.into();
		loop {
			let old = self.snap.load_full();
			let mut next = Snapshot::clone(&old);
			let displaced = match next.insert(&pattern, &name, &handler, self.policy) {
				Insert::Rejected => {
					return Err(RegistryError::Duplicate {
						address: pattern.to_string(),
						name,
					});
				}
				Insert::New => None,
				Insert::Replaced(previous) => Some(previous),
			};

			let prev = self.snap.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				if displaced.is_some() {
					tracing::debug!(address = %pattern, operation = %name, "operation handler replaced");
				} else {
					tracing::trace!(address = %pattern, operation = %name, "operation handler registered");
				}
				return Ok(displaced);
			}
		}
	}

	/// Removes the handler registered for exactly `name` at `pattern`.
	pub fn unregister(&self, pattern: &PathAddress, name: &str) -> Option<Arc<H>> {
		loop {
			let old = self.snap.load_full();
			let mut next = Snapshot::clone(&old);
			let removed = next.remove(pattern, name)?;
			let prev = self.snap.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				return Some(removed);
			}
		}
	}

	/// Finds the most specific handler for `name` whose pattern matches `address`.
	pub fn lookup(&self, address: &PathAddress, name: &str) -> Option<Arc<H>> {
		let snap = self.snap.load();
		snap.by_name
			.get(name)?
			.iter()
			.filter(|entry| pattern_matches(&entry.pattern, address))
			.max_by(|a, b| cmp_specificity(&a.pattern, &b.pattern))
			.map(|entry| Arc::clone(&entry.handler))
	}

	/// Returns the sorted names of every operation resolvable at `address`.
	pub fn operation_names(&self, address: &PathAddress) -> Vec<String> {
		let snap = self.snap.load();
		let mut names: Vec<String> = snap
			.by_name
			.iter()
			.filter(|(_, entries)| entries.iter().any(|entry| pattern_matches(&entry.pattern, address)))
			.map(|(name, _)| name.clone())
			.collect();
		names.sort_unstable();
		names
	}

	/// Total number of registrations.
	pub fn len(&self) -> usize {
		self.snap.load().by_name.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

fn pattern_matches(pattern: &PathAddress, address: &PathAddress) -> bool {
	pattern.len() == address.len() && pattern.iter().zip(address).all(|(p, a)| p.matches(a))
}

/// Orders two matching patterns: the first exact element facing a wildcard decides.
fn cmp_specificity(a: &PathAddress, b: &PathAddress) -> Ordering {
	for (x, y) in a.iter().zip(b) {
		match (x.is_wildcard(), y.is_wildcard()) {
			(false, true) => return Ordering::Greater,
			(true, false) => return Ordering::Less,
			_ => {}
		}
	}
	Ordering::Equal
}

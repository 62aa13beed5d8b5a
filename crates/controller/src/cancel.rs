use std::sync::{Arc, LazyLock};

use tokio_util::sync::CancellationToken;

/// Handle through which a caller may request cancellation of a running operation.
///
/// Cancellation is cooperative: the handler decides whether to honor it and
/// still delivers exactly one terminal outcome.
pub trait Cancellable: Send + Sync {
	/// Requests cancellation.
	///
	/// Returns true if this call was the first request. Further calls are no-ops.
	fn cancel(&self) -> bool;
}

/// Cancellable for operations that have nothing to cancel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCancellable;

impl Cancellable for NullCancellable {
	fn cancel(&self) -> bool {
		false
	}
}

static NULL: LazyLock<Arc<dyn Cancellable>> = LazyLock::new(|| Arc::new(NullCancellable));

/// Returns the shared inert handle.
pub fn null_cancellable() -> Arc<dyn Cancellable> {
	Arc::clone(&NULL)
}

/// Returns true if `handle` is the shared inert handle.
pub fn is_null_cancellable(handle: &Arc<dyn Cancellable>) -> bool {
	Arc::ptr_eq(handle, &NULL)
}

impl Cancellable for CancellationToken {
	fn cancel(&self) -> bool {
		let first = !self.is_cancelled();
		CancellationToken::cancel(self);
		first
	}
}

//! Per-thread interrupt flags.
//!
//! Every thread owns one flag. Another thread interrupts it through an
//! [`Interrupter`] obtained on the target thread; the target observes the flag
//! with [`interrupted`] (test-and-clear) or [`is_interrupted`]. A blocking wait
//! that should wake on interrupt registers a waker for its duration.
//!
//! ```
//! use std::thread;
//! use steward_controller::interrupt::{self, Interrupter};
//!
//! let (tx, rx) = std::sync::mpsc::channel();
//! let worker = thread::spawn(move || {
//! 	tx.send(Interrupter::current()).unwrap();
//! 	while !interrupt::interrupted() {
//! 		thread::yield_now();
//! 	}
//! });
//! rx.recv().unwrap().interrupt();
//! worker.join().unwrap();
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

type Waker = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct InterruptState {
	flag: AtomicBool,
	waker: Mutex<Option<Waker>>,
}

thread_local! {
	static CURRENT: Arc<InterruptState> = Arc::new(InterruptState::default());
}

/// Handle for interrupting one thread.
#[derive(Clone)]
pub struct Interrupter {
	state: Arc<InterruptState>,
}

impl fmt::Debug for Interrupter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Interrupter")
			.field("interrupted", &self.is_interrupted())
			.finish()
	}
}

impl Interrupter {
	/// Returns the handle for the calling thread.
	pub fn current() -> Self {
		CURRENT.with(|state| Self { state: Arc::clone(state) })
	}

	/// Sets the thread's flag and wakes its registered wait, if any.
	pub fn interrupt(&self) {
		self.state.flag.store(true, Ordering::SeqCst);
		let waker = self.state.waker.lock().clone();
		if let Some(wake) = waker {
			wake();
		}
	}

	/// Returns the thread's flag without clearing it.
	pub fn is_interrupted(&self) -> bool {
		self.state.flag.load(Ordering::SeqCst)
	}

	/// Installs `waker` until the returned registration is dropped.
	///
	/// The waker runs on the interrupting thread after the flag is set. A wait
	/// that checks the flag and blocks under the same lock the waker takes
	/// cannot miss an interrupt.
	pub(crate) fn register_waker(&self, waker: Waker) -> WakerRegistration {
		*self.state.waker.lock() = Some(waker);
		WakerRegistration {
			state: Arc::clone(&self.state),
		}
	}
}

/// Removes the registered waker on drop.
pub(crate) struct WakerRegistration {
	state: Arc<InterruptState>,
}

impl Drop for WakerRegistration {
	fn drop(&mut self) {
		*self.state.waker.lock() = None;
	}
}

/// Returns and clears the calling thread's interrupt flag.
pub fn interrupted() -> bool {
	CURRENT.with(|state| state.flag.swap(false, Ordering::SeqCst))
}

/// Returns the calling thread's interrupt flag without clearing it.
pub fn is_interrupted() -> bool {
	CURRENT.with(|state| state.flag.load(Ordering::SeqCst))
}

/// Sets the calling thread's interrupt flag, e.g. to restore a consumed interrupt.
pub fn set_interrupted() {
	CURRENT.with(|state| state.flag.store(true, Ordering::SeqCst));
}

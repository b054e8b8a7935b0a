//! Memoisation primitives for the render loop: a rate-limited memo driven by
//! an explicit timer queue, a structural-equality memo, and the observable
//! value holder both publish through.

pub mod debounced;
pub mod deep;
pub mod observable;
pub mod scheduler;

pub use debounced::{DebouncedMemo, Shallow};
pub use deep::DeepMemo;
pub use scheduler::TimerQueue;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A panicking factory must not wedge every later render pass.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

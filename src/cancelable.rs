//! Cancellation handles.
//!
//! A `Cancelable` makes one idempotent transition from live to canceled.
//! Streams cancel cooperatively through the ack channel; these handles cover
//! the places that still need an explicit switch: the `connect()` gate of a
//! connectable observable, scheduler cadences, and the reference counting
//! that defers a merge's completion until every inner stream has finished.

mod composite;
mod ref_count;
mod single_assignment;

use std::sync::Arc;

pub use composite::CompositeCancelable;
use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;
pub use ref_count::{ChildCancelable, RefCountCancelable};
pub use single_assignment::SingleAssignmentCancelable;

pub trait Cancelable: Send + Sync {
  /// Idempotent; at most one transition from live to canceled.
  fn cancel(&self);

  fn is_canceled(&self) -> bool;
}

pub type CancelableRef = Arc<dyn Cancelable>;

/// A cancelable wrapping an optional action executed at most once, at
/// cancel time.
pub struct BooleanCancelable {
  canceled: AtomicCell<bool>,
  action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl BooleanCancelable {
  pub fn new() -> Self {
    BooleanCancelable { canceled: AtomicCell::new(false), action: Mutex::new(None) }
  }

  pub fn with_action(action: impl FnOnce() + Send + 'static) -> Self {
    BooleanCancelable {
      canceled: AtomicCell::new(false),
      action: Mutex::new(Some(Box::new(action))),
    }
  }
}

impl Default for BooleanCancelable {
  fn default() -> Self {
    BooleanCancelable::new()
  }
}

impl Cancelable for BooleanCancelable {
  fn cancel(&self) {
    if !self.canceled.swap(true) {
      if let Some(action) = self.action.lock().take() {
        action();
      }
    }
  }

  fn is_canceled(&self) -> bool {
    self.canceled.load()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn action_runs_at_most_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&runs);
    let cancelable =
      BooleanCancelable::with_action(move || {
        counted.fetch_add(1, Ordering::SeqCst);
      });
    assert!(!cancelable.is_canceled());
    cancelable.cancel();
    cancelable.cancel();
    assert!(cancelable.is_canceled());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }
}

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::cancelable::Cancelable;

/// A cancelable that issues child handles and runs a completion action
/// exactly once, after its own `cancel` has been called and every acquired
/// child has been canceled.
///
/// This is how a merge defers the outer `on_complete` until all spawned
/// inner streams have terminated: each inner subscription acquires one
/// reference and releases it on termination; the outer completion releases
/// the main reference.
#[derive(Clone)]
pub struct RefCountCancelable {
  inner: Arc<RefCountInner>,
}

struct RefCountInner {
  // Holds one reference for the main handle plus one per live child.
  count: AtomicUsize,
  main_canceled: AtomicCell<bool>,
  on_complete: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl RefCountInner {
  fn release(self: &Arc<Self>) {
    if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
      if let Some(action) = self.on_complete.lock().take() {
        action();
      }
    }
  }
}

impl RefCountCancelable {
  pub fn new(on_complete: impl FnOnce() + Send + 'static) -> Self {
    RefCountCancelable {
      inner: Arc::new(RefCountInner {
        count: AtomicUsize::new(1),
        main_canceled: AtomicCell::new(false),
        on_complete: Mutex::new(Some(Box::new(on_complete))),
      }),
    }
  }

  /// Acquire a child reference; the child must be canceled exactly once.
  /// Acquiring after the count already hit zero yields an inert,
  /// pre-canceled child.
  pub fn acquire(&self) -> ChildCancelable {
    if self.inner.count.load(Ordering::Acquire) == 0 {
      return ChildCancelable { inner: Arc::clone(&self.inner), released: AtomicCell::new(true) };
    }
    self.inner.count.fetch_add(1, Ordering::AcqRel);
    ChildCancelable { inner: Arc::clone(&self.inner), released: AtomicCell::new(false) }
  }
}

impl Cancelable for RefCountCancelable {
  fn cancel(&self) {
    if !self.inner.main_canceled.swap(true) {
      self.inner.release();
    }
  }

  fn is_canceled(&self) -> bool {
    self.inner.main_canceled.load()
  }
}

/// A reference issued by [`RefCountCancelable::acquire`].
pub struct ChildCancelable {
  inner: Arc<RefCountInner>,
  released: AtomicCell<bool>,
}

impl Cancelable for ChildCancelable {
  fn cancel(&self) {
    if !self.released.swap(true) {
      self.inner.release();
    }
  }

  fn is_canceled(&self) -> bool {
    self.released.load()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::atomic::AtomicUsize;

  fn counting() -> (RefCountCancelable, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&runs);
    let refs = RefCountCancelable::new(move || {
      counted.fetch_add(1, Ordering::SeqCst);
    });
    (refs, runs)
  }

  #[test]
  fn completes_when_main_and_children_are_done() {
    let (refs, runs) = counting();
    let a = refs.acquire();
    let b = refs.acquire();
    refs.cancel();
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    a.cancel();
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    b.cancel();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn completion_runs_exactly_once() {
    let (refs, runs) = counting();
    let child = refs.acquire();
    child.cancel();
    child.cancel();
    refs.cancel();
    refs.cancel();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn completes_without_children() {
    let (refs, runs) = counting();
    refs.cancel();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }
}

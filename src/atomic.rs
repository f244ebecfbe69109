//! Atomic cells.
//!
//! `Atomic<T>` holds a value of any type behind a lock-free compare-and-set
//! cell; the transform family retries a read-modify-CAS loop until it wins,
//! so user transforms must be pure. Machine integers get `AtomicLong`, a
//! thin layer over the hardware fetch-add primitives.

use std::{
  ops::{Add, Sub},
  sync::atomic::{AtomicI64, Ordering},
  sync::Arc,
};

use arc_swap::ArcSwap;

/// A reference holding a value of type `T` with read, write,
/// compare-and-set and transform operations.
///
/// Values are stored as immutable `Arc<T>` snapshots; `compare_and_set`
/// succeeds only against the identical snapshot previously loaded, which is
/// what the retry loops rely on.
pub struct Atomic<T> {
  cell: ArcSwap<T>,
}

impl<T> Atomic<T> {
  pub fn new(value: T) -> Self {
    Atomic { cell: ArcSwap::from_pointee(value) }
  }

  /// Snapshot of the current value.
  pub fn load(&self) -> Arc<T> {
    self.cell.load_full()
  }

  /// Cloned copy of the current value.
  pub fn get(&self) -> T
  where
    T: Clone,
  {
    (*self.load()).clone()
  }

  pub fn set(&self, value: T) {
    self.cell.store(Arc::new(value));
  }

  /// Same visibility as `set`; kept for surface parity with the
  /// machine-word cells, which do have a relaxed store.
  pub fn lazy_set(&self, value: T) {
    self.cell.store(Arc::new(value));
  }

  pub fn get_and_set(&self, value: T) -> Arc<T> {
    self.cell.swap(Arc::new(value))
  }

  /// Identity compare-and-set against a previously loaded snapshot.
  /// Acquire-release on success.
  pub fn compare_and_set(&self, expected: &Arc<T>, update: T) -> bool {
    self.cas(expected, Arc::new(update))
  }

  fn cas(&self, expected: &Arc<T>, update: Arc<T>) -> bool {
    let mut swapped = false;
    self.cell.rcu(|current| {
      if Arc::ptr_eq(current, expected) {
        swapped = true;
        Arc::clone(&update)
      } else {
        swapped = false;
        Arc::clone(current)
      }
    });
    swapped
  }

  /// Replace the value with `f(current)`, retrying on contention. `f` may
  /// run several times and must be side-effect free.
  pub fn transform(&self, f: impl Fn(&T) -> T) {
    self.cell.rcu(|current| Arc::new(f(current)));
  }

  /// Transform and return the value this call installed.
  pub fn transform_and_get(&self, f: impl Fn(&T) -> T) -> Arc<T> {
    loop {
      let current = self.load();
      let next = Arc::new(f(&current));
      if self.cas(&current, Arc::clone(&next)) {
        return next;
      }
    }
  }

  /// Transform and return the value this call replaced.
  pub fn get_and_transform(&self, f: impl Fn(&T) -> T) -> Arc<T> {
    loop {
      let current = self.load();
      if self.cas(&current, Arc::new(f(&current))) {
        return current;
      }
    }
  }

  /// Transform to the first component of `f(current)` and hand back the
  /// second, the way a state machine extracts a decision from a transition.
  pub fn transform_and_extract<R>(&self, f: impl Fn(&T) -> (T, R)) -> R {
    loop {
      let current = self.load();
      let (next, extracted) = f(&current);
      if self.cas(&current, Arc::new(next)) {
        return extracted;
      }
    }
  }
}

impl<T: Clone + Add<Output = T>> Atomic<T> {
  pub fn add(&self, n: T) {
    self.transform(move |v| v.clone() + n.clone());
  }

  pub fn add_and_get(&self, n: T) -> Arc<T> {
    self.transform_and_get(move |v| v.clone() + n.clone())
  }

  pub fn get_and_add(&self, n: T) -> Arc<T> {
    self.get_and_transform(move |v| v.clone() + n.clone())
  }
}

impl<T: Clone + Add<Output = T> + From<u8>> Atomic<T> {
  pub fn increment(&self) {
    self.add(T::from(1));
  }

  pub fn increment_and_get(&self) -> Arc<T> {
    self.add_and_get(T::from(1))
  }
}

impl<T: Clone + Sub<Output = T> + From<u8>> Atomic<T> {
  pub fn decrement(&self) {
    self.transform(|v| v.clone() - T::from(1));
  }

  pub fn decrement_and_get(&self) -> Arc<T> {
    self.transform_and_get(|v| v.clone() - T::from(1))
  }
}

impl<T: Default> Default for Atomic<T> {
  fn default() -> Self {
    Atomic::new(T::default())
  }
}

/// Machine-integer cell backed by hardware atomics.
pub struct AtomicLong(AtomicI64);

impl AtomicLong {
  pub fn new(value: i64) -> Self {
    AtomicLong(AtomicI64::new(value))
  }

  pub fn get(&self) -> i64 {
    self.0.load(Ordering::Acquire)
  }

  pub fn set(&self, value: i64) {
    self.0.store(value, Ordering::Release);
  }

  /// Store without ordering guarantees toward other memory operations.
  pub fn lazy_set(&self, value: i64) {
    self.0.store(value, Ordering::Relaxed);
  }

  pub fn get_and_set(&self, value: i64) -> i64 {
    self.0.swap(value, Ordering::AcqRel)
  }

  pub fn compare_and_set(&self, expected: i64, update: i64) -> bool {
    self
      .0
      .compare_exchange(expected, update, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }

  pub fn increment(&self) {
    self.0.fetch_add(1, Ordering::AcqRel);
  }

  pub fn decrement(&self) {
    self.0.fetch_sub(1, Ordering::AcqRel);
  }

  pub fn increment_and_get(&self) -> i64 {
    self.0.fetch_add(1, Ordering::AcqRel) + 1
  }

  pub fn decrement_and_get(&self) -> i64 {
    self.0.fetch_sub(1, Ordering::AcqRel) - 1
  }

  pub fn add_and_get(&self, n: i64) -> i64 {
    self.0.fetch_add(n, Ordering::AcqRel) + n
  }

  pub fn get_and_add(&self, n: i64) -> i64 {
    self.0.fetch_add(n, Ordering::AcqRel)
  }
}

impl Default for AtomicLong {
  fn default() -> Self {
    AtomicLong::new(0)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use rust_decimal::Decimal;
  use std::thread;

  #[test]
  fn get_set_swap() {
    let cell = Atomic::new(1);
    assert_eq!(cell.get(), 1);
    cell.set(2);
    assert_eq!(cell.get(), 2);
    assert_eq!(*cell.get_and_set(3), 2);
    assert_eq!(cell.get(), 3);
  }

  #[test]
  fn compare_and_set_is_identity_based() {
    let cell = Atomic::new(10);
    let snapshot = cell.load();
    assert!(cell.compare_and_set(&snapshot, 11));
    // The old snapshot no longer matches.
    assert!(!cell.compare_and_set(&snapshot, 12));
    assert_eq!(cell.get(), 11);
  }

  #[test]
  fn transform_family() {
    let cell = Atomic::new(5);
    cell.transform(|v| v * 2);
    assert_eq!(cell.get(), 10);
    assert_eq!(*cell.transform_and_get(|v| v + 1), 11);
    assert_eq!(*cell.get_and_transform(|v| v + 1), 11);
    assert_eq!(cell.get(), 12);
    let old = cell.transform_and_extract(|v| (0, *v));
    assert_eq!(old, 12);
    assert_eq!(cell.get(), 0);
  }

  #[test]
  fn arbitrary_precision_counters() {
    let cell = Atomic::new(Decimal::from(100));
    cell.increment_and_get();
    assert_eq!(*cell.increment_and_get(), Decimal::from(102));
    cell.add_and_get(Decimal::from(20));
    assert_eq!(*cell.add_and_get(Decimal::from(20)), Decimal::from(142));
  }

  #[test]
  fn contended_increments() {
    let cell = Arc::new(Atomic::new(0i64));
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let cell = Arc::clone(&cell);
        thread::spawn(move || {
          for _ in 0..500 {
            cell.increment();
          }
        })
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }
    assert_eq!(cell.get(), 4000);
  }

  #[test]
  fn atomic_long_arithmetic() {
    let cell = AtomicLong::new(100);
    assert_eq!(cell.increment_and_get(), 101);
    assert_eq!(cell.add_and_get(20), 121);
    assert_eq!(cell.get_and_add(20), 121);
    assert_eq!(cell.get(), 141);
    assert!(cell.compare_and_set(141, 0));
    assert!(!cell.compare_and_set(141, 1));
    assert_eq!(cell.decrement_and_get(), -1);
  }
}

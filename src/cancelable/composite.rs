use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::cancelable::{Cancelable, CancelableRef};

/// A collection of cancelables canceled together.
///
/// Adding to an already-canceled composite cancels the newcomer
/// immediately; removal compares by handle identity.
pub struct CompositeCancelable {
  // None once canceled.
  children: Mutex<Option<SmallVec<[CancelableRef; 4]>>>,
}

impl CompositeCancelable {
  pub fn new() -> Self {
    CompositeCancelable { children: Mutex::new(Some(SmallVec::new())) }
  }

  pub fn add(&self, child: CancelableRef) {
    let mut children = self.children.lock();
    match children.as_mut() {
      Some(list) => list.push(child),
      None => {
        drop(children);
        child.cancel();
      }
    }
  }

  pub fn remove(&self, child: &CancelableRef) {
    if let Some(list) = self.children.lock().as_mut() {
      list.retain(|c| !Arc::ptr_eq(c, child));
    }
  }

  pub fn len(&self) -> usize {
    self.children.lock().as_ref().map_or(0, |list| list.len())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for CompositeCancelable {
  fn default() -> Self {
    CompositeCancelable::new()
  }
}

impl Cancelable for CompositeCancelable {
  fn cancel(&self) {
    let children = self.children.lock().take();
    if let Some(list) = children {
      for child in list {
        child.cancel();
      }
    }
  }

  fn is_canceled(&self) -> bool {
    self.children.lock().is_none()
  }
}

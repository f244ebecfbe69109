use crate::{
  atomic::Atomic,
  cancelable::{Cancelable, CancelableRef},
  error::StreamError,
};

/// A cancelable whose target is assigned exactly once.
///
/// Setting after cancellation cancels the target immediately; a second
/// assignment is an error.
pub struct SingleAssignmentCancelable {
  state: Atomic<State>,
}

#[derive(Clone)]
enum State {
  Empty,
  Set(CancelableRef),
  Canceled,
}

impl SingleAssignmentCancelable {
  pub fn new() -> Self {
    SingleAssignmentCancelable { state: Atomic::new(State::Empty) }
  }

  pub fn set(&self, target: CancelableRef) -> Result<(), StreamError> {
    enum Outcome {
      Assigned,
      CancelNow,
      AlreadySet,
    }
    let outcome = self.state.transform_and_extract(|state| match state {
      State::Empty => (State::Set(target.clone()), Outcome::Assigned),
      State::Canceled => (State::Canceled, Outcome::CancelNow),
      State::Set(existing) => (State::Set(existing.clone()), Outcome::AlreadySet),
    });
    match outcome {
      Outcome::Assigned => Ok(()),
      Outcome::CancelNow => {
        target.cancel();
        Ok(())
      }
      Outcome::AlreadySet => {
        Err(StreamError::msg("single-assignment cancelable set twice"))
      }
    }
  }
}

impl Default for SingleAssignmentCancelable {
  fn default() -> Self {
    SingleAssignmentCancelable::new()
  }
}

impl Cancelable for SingleAssignmentCancelable {
  fn cancel(&self) {
    let target = self.state.transform_and_extract(|state| match state {
      State::Set(target) => (State::Canceled, Some(target.clone())),
      _ => (State::Canceled, None),
    });
    if let Some(target) = target {
      target.cancel();
    }
  }

  fn is_canceled(&self) -> bool {
    matches!(*self.state.load(), State::Canceled)
  }
}

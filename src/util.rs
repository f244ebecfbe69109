use std::{
  future::Future,
  panic::{catch_unwind, AssertUnwindSafe},
  time::Duration,
};

use futures::channel::oneshot;

use crate::{error::StreamError, scheduler::SchedulerRef};

/// Run user code, converting a panic into a stream error. Operators call
/// every user-supplied closure through this so a failure is routed to
/// `on_error` instead of unwinding through the producer.
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> Result<R, StreamError> {
  catch_unwind(AssertUnwindSafe(f)).map_err(StreamError::from_panic)
}

/// Sleep implemented through the scheduler's delayed-submit, so timed
/// operators never reach for a timer behind the scheduler's back.
pub(crate) fn sleep(scheduler: &SchedulerRef, delay: Duration) -> impl Future<Output = ()> {
  let (tx, rx) = oneshot::channel::<()>();
  scheduler.execute_after(
    delay,
    Box::pin(async move {
      let _ = tx.send(());
    }),
  );
  async move {
    let _ = rx.await;
  }
}

//! The execution context of a stream.
//!
//! The core only consumes this interface; any `futures` executor works
//! through the blanket [`Spawn`] adapter. Producers are spawned as tasks,
//! timed operators go through `execute_after`, and failures that cannot be
//! delivered through a stream (a callback raised after the terminal event)
//! are reported out of band, never re-entered into the stream.

use std::{sync::Arc, time::Duration};

use futures::{
  future::BoxFuture,
  task::{Spawn, SpawnExt},
};
use futures_timer::Delay;

use crate::{
  cancelable::{BooleanCancelable, Cancelable},
  error::StreamError,
};

pub trait Scheduler: Send + Sync + 'static {
  /// Submit a one-shot task for execution.
  fn execute(&self, task: BoxFuture<'static, ()>);

  /// Submit a one-shot task that starts after `delay`.
  fn execute_after(&self, delay: Duration, task: BoxFuture<'static, ()>);

  /// Report a failure that has no stream left to travel on.
  fn report_failure(&self, error: StreamError);
}

pub type SchedulerRef = Arc<dyn Scheduler>;

impl<S> Scheduler for S
where
  S: Spawn + Send + Sync + 'static,
{
  fn execute(&self, task: BoxFuture<'static, ()>) {
    self.spawn(task).expect("spawn task on executor failed.");
  }

  fn execute_after(&self, delay: Duration, task: BoxFuture<'static, ()>) {
    self
      .spawn(async move {
        Delay::new(delay).await;
        task.await;
      })
      .expect("spawn task on executor failed.");
  }

  fn report_failure(&self, error: StreamError) {
    log::error!("unhandled stream failure: {error}");
  }
}

/// Recurring scheduling, derived from `execute_after`.
pub trait SchedulerExt {
  /// Run `task` after `initial`, then every `period`, until the returned
  /// handle is canceled.
  fn execute_periodic(
    &self,
    initial: Duration,
    period: Duration,
    task: Box<dyn FnMut() + Send>,
  ) -> Arc<BooleanCancelable>;
}

impl SchedulerExt for SchedulerRef {
  fn execute_periodic(
    &self,
    initial: Duration,
    period: Duration,
    task: Box<dyn FnMut() + Send>,
  ) -> Arc<BooleanCancelable> {
    let gate = Arc::new(BooleanCancelable::new());
    step(self.clone(), initial, period, task, Arc::clone(&gate));
    gate
  }
}

fn step(
  scheduler: SchedulerRef,
  delay: Duration,
  period: Duration,
  mut task: Box<dyn FnMut() + Send>,
  gate: Arc<BooleanCancelable>,
) {
  let again = scheduler.clone();
  scheduler.execute_after(
    delay,
    Box::pin(async move {
      if gate.is_canceled() {
        return;
      }
      task();
      step(again, period, period, task, gate);
    }),
  );
}

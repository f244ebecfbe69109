use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  ack::{Ack, AckFuture, AckPromise, SharedAck},
  error::StreamError,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
};

/// Re-schedule every downstream call onto the given scheduler.
///
/// Deliveries are serialized by chaining each scheduled task behind the
/// previous acknowledgement, so a pool scheduler cannot reorder them; the
/// producer's ack resolves only when the rescheduled downstream call's ack
/// does, which keeps back-pressure intact across the hop.
pub trait ObserveOn: Observable {
  fn observe_on(self, scheduler: SchedulerRef) -> ObserveOnOp<Self> {
    ObserveOnOp { source: self, scheduler }
  }
}

impl<S: Observable> ObserveOn for S {}

pub struct ObserveOnOp<S> {
  source: S,
  scheduler: SchedulerRef,
}

impl<S: Observable> Observable for ObserveOnOp<S> {
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let ObserveOnOp { source, scheduler } = self;
    source.unsafe_subscribe(subscriber.transform(|observer| ObserveOnObserver {
      observer: Arc::new(Mutex::new(observer)),
      scheduler,
      last: SharedAck::CONTINUE,
      done: false,
    }));
  }
}

pub struct ObserveOnObserver<O> {
  observer: Arc<Mutex<O>>,
  scheduler: SchedulerRef,
  // Last scheduled delivery's ack; the next delivery chains behind it.
  last: SharedAck,
  done: bool,
}

impl<T: Send + 'static, O: Observer<T>> Observer<T> for ObserveOnObserver<O> {
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    let prev = std::mem::replace(&mut self.last, SharedAck::CONTINUE);
    let (release, ack) = AckPromise::pair();
    let shared = ack.shared();
    self.last = shared.clone();
    let observer = Arc::clone(&self.observer);
    self.scheduler.execute(Box::pin(async move {
      if prev.await.is_done() {
        release.complete(Ack::Done);
        return;
      }
      let ack = observer.lock().on_next(value);
      release.complete(ack.await);
    }));
    shared.into_ack_future()
  }

  fn on_complete(&mut self) {
    if self.done {
      return;
    }
    self.done = true;
    let prev = std::mem::replace(&mut self.last, SharedAck::DONE);
    let observer = Arc::clone(&self.observer);
    self.scheduler.execute(Box::pin(async move {
      if prev.await.is_done() {
        return;
      }
      observer.lock().on_complete();
    }));
  }

  fn on_error(&mut self, error: StreamError) {
    if self.done {
      return;
    }
    self.done = true;
    let prev = std::mem::replace(&mut self.last, SharedAck::DONE);
    let observer = Arc::clone(&self.observer);
    self.scheduler.execute(Box::pin(async move {
      if prev.await.is_done() {
        return;
      }
      observer.lock().on_error(error);
    }));
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::range;
  use crate::ops::into_future::AsFuture;
  use crate::ops::reduce::Fold;
  use futures::executor::{block_on, ThreadPool};
  use std::thread::ThreadId;

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  #[test]
  fn order_survives_the_hop() {
    let collected = block_on(
      range(0, 200)
        .observe_on(scheduler())
        .fold(Vec::new(), |mut acc, v| {
          acc.push(v);
          acc
        })
        .as_future(scheduler()),
    );
    assert_eq!(collected.unwrap(), Some((0..200).collect::<Vec<_>>()));
  }

  #[test]
  fn downstream_runs_on_the_target_scheduler() {
    let target: SchedulerRef = Arc::new(ThreadPool::builder().pool_size(1).create().unwrap());
    let observed = block_on(
      range(0, 5)
        .observe_on(target)
        .fold(Vec::<ThreadId>::new(), |mut acc, _| {
          acc.push(std::thread::current().id());
          acc
        })
        .as_future(scheduler()),
    )
    .unwrap()
    .unwrap();
    assert!(observed.windows(2).all(|w| w[0] == w[1]));
  }
}

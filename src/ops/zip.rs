use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use crate::{
  ack::{Ack, AckFuture, AckPromise},
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
};

/// Pair elements strictly by position.
///
/// The side that runs ahead waits: left elements park with an ack promise
/// until a right element arrives, right elements queue as plain values.
/// The stream completes when either side completes with its queue empty.
pub trait Zip: Observable {
  fn zip<S2>(self, other: S2) -> ZipOp<Self, S2>
  where
    S2: Observable,
  {
    ZipOp { left: self, right: other }
  }
}

impl<S: Observable> Zip for S {}

pub struct ZipOp<A, B> {
  left: A,
  right: B,
}

impl<A, B> Observable for ZipOp<A, B>
where
  A: Observable,
  B: Observable,
{
  type Item = (A::Item, B::Item);

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<(A::Item, B::Item)>,
  {
    let ZipOp { left, right } = self;
    let Subscriber { observer, scheduler } = subscriber;
    let core = Arc::new(Mutex::new(ZipCore {
      observer,
      left: VecDeque::new(),
      right: VecDeque::new(),
      left_done: false,
      right_done: false,
      stopped: false,
    }));
    left.unsafe_subscribe(Subscriber::new(
      LeftZipObserver { core: Arc::clone(&core) },
      scheduler.clone(),
    ));
    right.unsafe_subscribe(Subscriber::new(RightZipObserver { core }, scheduler));
  }
}

struct ZipCore<T, U, O> {
  observer: O,
  left: VecDeque<(T, AckPromise)>,
  right: VecDeque<U>,
  left_done: bool,
  right_done: bool,
  stopped: bool,
}

type ZipShared<T, U, O> = Arc<Mutex<ZipCore<T, U, O>>>;

struct LeftZipObserver<T, U, O> {
  core: ZipShared<T, U, O>,
}

struct RightZipObserver<T, U, O> {
  core: ZipShared<T, U, O>,
}

fn mark_stopped_on_done<T, U, O>(core: &ZipShared<T, U, O>, ack: AckFuture) -> AckFuture
where
  T: Send + 'static,
  U: Send + 'static,
  O: Observer<(T, U)>,
{
  match ack {
    AckFuture::Ready(Ack::Continue) => AckFuture::CONTINUE,
    AckFuture::Ready(Ack::Done) => {
      core.lock().stopped = true;
      AckFuture::DONE
    }
    AckFuture::Pending(future) => {
      let core = Arc::clone(core);
      AckFuture::pending(async move {
        let ack = future.await;
        if ack.is_done() {
          core.lock().stopped = true;
        }
        ack
      })
    }
  }
}

impl<T, U, O> Observer<T> for LeftZipObserver<T, U, O>
where
  T: Send + 'static,
  U: Send + 'static,
  O: Observer<(T, U)>,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    let mut core = self.core.lock();
    if core.stopped {
      return AckFuture::DONE;
    }
    if let Some(paired) = core.right.pop_front() {
      let ack = core.observer.on_next((value, paired));
      if core.right_done && core.right.is_empty() {
        core.stopped = true;
        core.observer.on_complete();
        return AckFuture::DONE;
      }
      drop(core);
      mark_stopped_on_done(&self.core, ack)
    } else if core.right_done {
      core.stopped = true;
      core.observer.on_complete();
      AckFuture::DONE
    } else {
      let (promise, ack) = AckPromise::pair();
      core.left.push_back((value, promise));
      ack
    }
  }

  fn on_complete(&mut self) {
    let mut core = self.core.lock();
    core.left_done = true;
    if core.left.is_empty() && !core.stopped {
      core.stopped = true;
      core.right.clear();
      core.observer.on_complete();
    }
  }

  fn on_error(&mut self, error: StreamError) {
    let mut core = self.core.lock();
    // Dropping the parked promises resolves them to Done.
    core.left.clear();
    if !core.stopped {
      core.stopped = true;
      core.observer.on_error(error);
    }
  }
}

impl<T, U, O> Observer<U> for RightZipObserver<T, U, O>
where
  T: Send + 'static,
  U: Send + 'static,
  O: Observer<(T, U)>,
{
  fn on_next(&mut self, value: U) -> AckFuture {
    let mut core = self.core.lock();
    if core.stopped {
      return AckFuture::DONE;
    }
    if let Some((parked, promise)) = core.left.pop_front() {
      let ack = core.observer.on_next((parked, value));
      if core.left_done && core.left.is_empty() {
        core.stopped = true;
        core.observer.on_complete();
        promise.complete(Ack::Done);
        return AckFuture::DONE;
      }
      drop(core);
      // Resume the parked left producer with the pair's ack, and hand the
      // same ack to the right producer.
      match mark_stopped_on_done(&self.core, ack) {
        AckFuture::Ready(ack) => {
          promise.complete(ack);
          AckFuture::Ready(ack)
        }
        AckFuture::Pending(future) => AckFuture::pending(async move {
          let ack = future.await;
          promise.complete(ack);
          ack
        }),
      }
    } else if core.left_done {
      core.stopped = true;
      core.observer.on_complete();
      AckFuture::DONE
    } else {
      core.right.push_back(value);
      AckFuture::CONTINUE
    }
  }

  fn on_complete(&mut self) {
    let mut core = self.core.lock();
    core.right_done = true;
    if core.right.is_empty() && !core.stopped {
      core.stopped = true;
      core.left.clear();
      core.observer.on_complete();
    }
  }

  fn on_error(&mut self, error: StreamError) {
    let mut core = self.core.lock();
    core.left.clear();
    if !core.stopped {
      core.stopped = true;
      core.observer.on_error(error);
    }
  }
}

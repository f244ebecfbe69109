use std::{marker::PhantomData, sync::Arc};

use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::{
  ack::{Ack, AckFuture, AckPromise, SharedAck},
  cancelable::{Cancelable, ChildCancelable, RefCountCancelable},
  error::StreamError,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
  util::guard,
};

/// Unordered flatten: inner observables are subscribed as their elements
/// arrive and their outputs interleave, serialized through a single
/// acknowledgement buffer. The outer completion is deferred by reference
/// counting until every inner stream has terminated.
pub trait MergeMap: Observable {
  fn merge_map<R, F>(self, f: F) -> MergeMapOp<Self, F>
  where
    R: Observable,
    F: FnMut(Self::Item) -> R + Send + 'static,
  {
    MergeMapOp { source: self, func: f }
  }
}

impl<S: Observable> MergeMap for S {}

pub trait MergeAll: Observable {
  fn merge_all(self) -> MergeAllOp<Self>
  where
    Self::Item: Observable,
  {
    MergeAllOp { source: self }
  }
}

impl<S: Observable> MergeAll for S {}

/// Combine two streams of the same element type by interleaving their
/// emissions.
pub trait Merge: Observable {
  fn merge<S2>(self, other: S2) -> MergeOp<Self, S2>
  where
    S2: Observable<Item = Self::Item>,
  {
    MergeOp { left: self, right: other }
  }
}

impl<S: Observable> Merge for S {}

/// Single-writer view over the last acknowledgement of a fan-in.
///
/// `schedule_next` chains each delivery behind the previous one, which
/// makes every inner completion observed through the buffer totally
/// ordered; after a terminal is scheduled, the terminal runs at most once
/// and every later `schedule_next` resolves to `Done`.
pub(crate) struct MergeBuffer<T, O> {
  downstream: Mutex<O>,
  // Last scheduled ack plus a generation stamp, so a finished chain can
  // promote the cell back to a resolved value if it is still current.
  last: Mutex<(SharedAck, u64)>,
  stopped: AtomicCell<bool>,
  _marker: PhantomData<fn(T)>,
}

impl<T, O> MergeBuffer<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  pub(crate) fn new(downstream: O) -> Arc<Self> {
    Arc::new(MergeBuffer {
      downstream: Mutex::new(downstream),
      last: Mutex::new((SharedAck::CONTINUE, 0)),
      stopped: AtomicCell::new(false),
      _marker: PhantomData,
    })
  }

  pub(crate) fn is_stopped(&self) -> bool {
    self.stopped.load()
  }

  pub(crate) fn schedule_next(self: &Arc<Self>, value: T) -> AckFuture {
    if self.stopped.load() {
      return AckFuture::DONE;
    }
    let mut last = self.last.lock();
    match last.0.as_ready() {
      Some(Ack::Continue) => {
        let ack = self.downstream.lock().on_next(value);
        let shared = ack.shared();
        last.0 = shared.clone();
        last.1 += 1;
        drop(last);
        shared.into_ack_future()
      }
      Some(Ack::Done) => AckFuture::DONE,
      None => {
        let prev = last.0.clone();
        let (release, ack) = AckPromise::pair();
        last.0 = ack.shared();
        last.1 += 1;
        let my_generation = last.1;
        drop(last);
        let this = Arc::clone(self);
        AckFuture::pending(async move {
          let promote = |ack: Ack| {
            let mut last = this.last.lock();
            if last.1 == my_generation {
              last.0 = SharedAck::Ready(ack);
            }
          };
          if prev.await.is_done() {
            release.complete(Ack::Done);
            promote(Ack::Done);
            return Ack::Done;
          }
          let ack = this.downstream.lock().on_next(value);
          let ack = ack.await;
          release.complete(ack);
          promote(ack);
          ack
        })
      }
    }
  }

  pub(crate) fn schedule_complete(self: &Arc<Self>, scheduler: &SchedulerRef) {
    self.schedule_terminal(None, scheduler);
  }

  pub(crate) fn schedule_error(self: &Arc<Self>, error: StreamError, scheduler: &SchedulerRef) {
    self.schedule_terminal(Some(error), scheduler);
  }

  fn schedule_terminal(self: &Arc<Self>, error: Option<StreamError>, scheduler: &SchedulerRef) {
    if self.stopped.swap(true) {
      return;
    }
    let prev = self.last.lock().0.clone();
    let this = Arc::clone(self);
    scheduler.execute(Box::pin(async move {
      if prev.await.is_done() {
        return;
      }
      match error {
        None => this.downstream.lock().on_complete(),
        Some(error) => this.downstream.lock().on_error(error),
      }
    }));
  }
}

#[derive(Clone)]
pub struct MergeMapOp<S, F> {
  source: S,
  func: F,
}

impl<S, R, F> Observable for MergeMapOp<S, F>
where
  S: Observable,
  R: Observable,
  F: FnMut(S::Item) -> R + Send + 'static,
{
  type Item = R::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<R::Item>,
  {
    let MergeMapOp { source, func } = self;
    let Subscriber { observer, scheduler } = subscriber;
    let buffer = MergeBuffer::new(observer);
    let completion_buffer = Arc::clone(&buffer);
    let completion_scheduler = scheduler.clone();
    let refs = RefCountCancelable::new(move || {
      completion_buffer.schedule_complete(&completion_scheduler);
    });
    let outer = MergeMapObserver { buffer, refs, func, scheduler: scheduler.clone() };
    source.unsafe_subscribe(Subscriber::new(outer, scheduler));
  }
}

#[derive(Clone)]
pub struct MergeAllOp<S> {
  source: S,
}

impl<S> Observable for MergeAllOp<S>
where
  S: Observable,
  S::Item: Observable,
{
  type Item = <S::Item as Observable>::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<Self::Item>,
  {
    let identity: fn(S::Item) -> S::Item = std::convert::identity;
    MergeMapOp { source: self.source, func: identity }.unsafe_subscribe(subscriber);
  }
}

pub struct MergeOp<S1, S2> {
  left: S1,
  right: S2,
}

impl<S1, S2> Observable for MergeOp<S1, S2>
where
  S1: Observable,
  S2: Observable<Item = S1::Item>,
{
  type Item = S1::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S1::Item>,
  {
    let MergeOp { left, right } = self;
    let Subscriber { observer, scheduler } = subscriber;
    let buffer = MergeBuffer::new(observer);
    let completion_buffer = Arc::clone(&buffer);
    let completion_scheduler = scheduler.clone();
    let refs = RefCountCancelable::new(move || {
      completion_buffer.schedule_complete(&completion_scheduler);
    });
    let left_observer = MergeInnerObserver {
      buffer: Arc::clone(&buffer),
      child: Some(refs.acquire()),
      scheduler: scheduler.clone(),
    };
    let right_observer = MergeInnerObserver {
      buffer,
      child: Some(refs.acquire()),
      scheduler: scheduler.clone(),
    };
    // Both branches hold a reference; the main one is released up front.
    refs.cancel();
    left.unsafe_subscribe(Subscriber::new(left_observer, scheduler.clone()));
    right.unsafe_subscribe(Subscriber::new(right_observer, scheduler));
  }
}

pub struct MergeMapObserver<I, O, F> {
  buffer: Arc<MergeBuffer<I, O>>,
  refs: RefCountCancelable,
  func: F,
  scheduler: SchedulerRef,
}

impl<T, I, R, O, F> Observer<T> for MergeMapObserver<I, O, F>
where
  T: Send + 'static,
  I: Send + 'static,
  R: Observable<Item = I>,
  O: Observer<I>,
  F: FnMut(T) -> R + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.buffer.is_stopped() {
      return AckFuture::DONE;
    }
    let func = &mut self.func;
    let inner = match guard(move || func(value)) {
      Ok(inner) => inner,
      Err(error) => {
        self.buffer.schedule_error(error, &self.scheduler);
        return AckFuture::DONE;
      }
    };
    let inner_observer = MergeInnerObserver {
      buffer: Arc::clone(&self.buffer),
      child: Some(self.refs.acquire()),
      scheduler: self.scheduler.clone(),
    };
    inner.unsafe_subscribe(Subscriber::new(inner_observer, self.scheduler.clone()));
    AckFuture::CONTINUE
  }

  fn on_complete(&mut self) {
    // Release the main reference; the terminal fires once all inners do.
    self.refs.cancel();
  }

  fn on_error(&mut self, error: StreamError) {
    self.buffer.schedule_error(error, &self.scheduler);
    self.refs.cancel();
  }
}

struct MergeInnerObserver<T, O> {
  buffer: Arc<MergeBuffer<T, O>>,
  child: Option<ChildCancelable>,
  scheduler: SchedulerRef,
}

impl<T, O> Observer<T> for MergeInnerObserver<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    self.buffer.schedule_next(value)
  }

  fn on_complete(&mut self) {
    if let Some(child) = self.child.take() {
      child.cancel();
    }
  }

  fn on_error(&mut self, error: StreamError) {
    self.buffer.schedule_error(error, &self.scheduler);
    if let Some(child) = self.child.take() {
      child.cancel();
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::{from_seq, range};
  use crate::ops::into_future::AsFuture;
  use crate::ops::reduce::Fold;
  use futures::executor::{block_on, ThreadPool};

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  fn collect_sorted<S>(source: S) -> Vec<S::Item>
  where
    S: Observable,
    S::Item: Ord,
  {
    let mut items = block_on(
      source
        .fold(Vec::new(), |mut acc, v| {
          acc.push(v);
          acc
        })
        .as_future(scheduler()),
    )
    .unwrap()
    .unwrap_or_default();
    items.sort();
    items
  }

  #[test]
  fn all_inner_elements_arrive() {
    let merged = collect_sorted(range(0, 4).merge_map(|v| from_seq(vec![v, v + 100])));
    assert_eq!(merged, vec![0, 1, 2, 3, 100, 101, 102, 103]);
  }

  #[test]
  fn completion_waits_for_every_inner() {
    let merged = collect_sorted(range(0, 50).merge_map(|v| from_seq(vec![v])));
    assert_eq!(merged, (0..50).collect::<Vec<_>>());
  }

  #[test]
  fn binary_merge_interleaves_two_sources() {
    let merged = collect_sorted(range(0, 5).merge(range(100, 105)));
    assert_eq!(merged, vec![0, 1, 2, 3, 4, 100, 101, 102, 103, 104]);
  }

  #[test]
  fn merge_all_flattens_a_stream_of_streams() {
    let merged =
      collect_sorted(from_seq(vec![range(0, 3), range(10, 13), range(20, 23)]).merge_all());
    assert_eq!(merged, vec![0, 1, 2, 10, 11, 12, 20, 21, 22]);
  }

  #[test]
  fn inner_failure_terminates_once() {
    let result = block_on(
      range(0i64, 10)
        .merge_map(|v| {
          if v == 3 {
            panic!("inner exploded");
          }
          from_seq(vec![v])
        })
        .fold(Vec::new(), |mut acc, v| {
          acc.push(v);
          acc
        })
        .as_future(scheduler()),
    );
    assert!(result.unwrap_err().to_string().contains("inner exploded"));
  }
}

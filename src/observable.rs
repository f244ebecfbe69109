//! The producing side of the protocol.
//!
//! An `Observable` is a deferred computation that, handed a subscriber,
//! starts a stream. Observables are cold: every subscription starts a fresh
//! production, unless the stream is multicast through a subject.

mod connectable;
mod from_fn;
mod from_iter;
mod interval;
mod trivial;

pub use connectable::ConnectableObservable;
pub use from_fn::{create, ObservableFromFn};
pub use from_iter::{from_iter, from_seq, range, FromIter};
pub use interval::{interval, interval_at, Interval};
pub use trivial::{continuous, empty, error, never, unit, Continuous, Empty, Never, Throw, Unit};

use crate::{
  error::StreamError,
  observer::{LambdaObserver, Observer, SafeObserver},
  ops::{
    concat::{ConcatAll, ConcatAllOp},
    merge::{MergeAll, MergeAllOp},
    zip::{Zip, ZipOp},
  },
  scheduler::SchedulerRef,
  subscriber::Subscriber,
  util::guard,
};

pub trait Observable: Send + Sized + 'static {
  type Item: Send + 'static;

  /// Start the stream. This is the protocol-level entry point: the observer
  /// is trusted to obey the grammar and a failure inside the subscribe
  /// function unwinds to the caller. Application code wants the `subscribe*`
  /// methods, which wrap the observer in a [`SafeObserver`] first.
  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<Self::Item>;

  fn subscribe_observer<O>(self, observer: O, scheduler: SchedulerRef)
  where
    O: Observer<Self::Item>,
  {
    let safe = SafeObserver::new(observer, scheduler.clone());
    let mut on_failure = safe.clone();
    if let Err(error) = guard(|| self.unsafe_subscribe(Subscriber::new(safe, scheduler))) {
      on_failure.on_error(error);
    }
  }

  /// Subscribe with a callback per item; failures go to the scheduler's
  /// failure reporter.
  fn subscribe<N>(self, next: N, scheduler: SchedulerRef)
  where
    N: FnMut(Self::Item) + Send + 'static,
  {
    let reporter = scheduler.clone();
    self.subscribe_all(next, move |e| reporter.report_failure(e), || {}, scheduler);
  }

  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C, scheduler: SchedulerRef)
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnOnce(StreamError) + Send + 'static,
    C: FnOnce() + Send + 'static,
  {
    self.subscribe_observer(LambdaObserver::new(next, error, complete), scheduler);
  }
}

/// Concatenate a collection of observables, in order; each inner stream is
/// subscribed only after the previous one completed.
pub fn concat<I>(sources: I) -> ConcatAllOp<FromIter<I>>
where
  I: IntoIterator + Send + 'static,
  I::Item: Observable,
  I::IntoIter: Send,
{
  from_iter(sources).concat_all()
}

/// Flatten a collection of observables in order; alias of [`concat`].
pub fn flatten<I>(sources: I) -> ConcatAllOp<FromIter<I>>
where
  I: IntoIterator + Send + 'static,
  I::Item: Observable,
  I::IntoIter: Send,
{
  concat(sources)
}

/// Merge a collection of observables; inner streams are subscribed as they
/// arrive and their outputs interleave.
pub fn merge<I>(sources: I) -> MergeAllOp<FromIter<I>>
where
  I: IntoIterator + Send + 'static,
  I::Item: Observable,
  I::IntoIter: Send,
{
  from_iter(sources).merge_all()
}

/// Pair two observables by position.
pub fn zip<A, B>(left: A, right: B) -> ZipOp<A, B>
where
  A: Observable,
  B: Observable,
{
  left.zip(right)
}

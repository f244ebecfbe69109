use std::sync::Arc;

use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::{
  ack::{Ack, AckFuture, AckPromise},
  error::StreamError,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
  util::guard,
};

/// Back-pressured, order-preserving flatten: each element maps to an inner
/// observable, and the next inner is subscribed only after the previous one
/// completed. The outer ack for an element resolves when its inner stream
/// terminates, so ordinary ack discipline is all the sequencing needed.
pub trait ConcatMap: Observable {
  fn concat_map<R, F>(self, f: F) -> ConcatMapOp<Self, F>
  where
    R: Observable,
    F: FnMut(Self::Item) -> R + Send + 'static,
  {
    ConcatMapOp { source: self, func: f }
  }

  /// Alias for [`concat_map`](ConcatMap::concat_map): the flatten of this
  /// protocol preserves order.
  fn flat_map<R, F>(self, f: F) -> ConcatMapOp<Self, F>
  where
    R: Observable,
    F: FnMut(Self::Item) -> R + Send + 'static,
  {
    self.concat_map(f)
  }
}

impl<S: Observable> ConcatMap for S {}

/// Flatten a stream of observables, preserving full order.
pub trait ConcatAll: Observable {
  fn concat_all(self) -> ConcatAllOp<Self>
  where
    Self::Item: Observable,
  {
    ConcatAllOp { source: self }
  }

  fn flatten(self) -> ConcatAllOp<Self>
  where
    Self::Item: Observable,
  {
    self.concat_all()
  }
}

impl<S: Observable> ConcatAll for S {}

#[derive(Clone)]
pub struct ConcatMapOp<S, F> {
  source: S,
  func: F,
}

impl<S, R, F> Observable for ConcatMapOp<S, F>
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
    let ConcatMapOp { source, func } = self;
    let Subscriber { observer, scheduler } = subscriber;
    let outer = ConcatMapObserver {
      downstream: Arc::new(Mutex::new(observer)),
      stopped: Arc::new(AtomicCell::new(false)),
      func,
      scheduler: scheduler.clone(),
    };
    source.unsafe_subscribe(Subscriber::new(outer, scheduler));
  }
}

#[derive(Clone)]
pub struct ConcatAllOp<S> {
  source: S,
}

impl<S> Observable for ConcatAllOp<S>
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
    ConcatMapOp { source: self.source, func: identity }.unsafe_subscribe(subscriber);
  }
}

pub struct ConcatMapObserver<O, F> {
  downstream: Arc<Mutex<O>>,
  stopped: Arc<AtomicCell<bool>>,
  func: F,
  scheduler: SchedulerRef,
}

impl<O, T, R, F> Observer<T> for ConcatMapObserver<O, F>
where
  T: Send + 'static,
  R: Observable,
  O: Observer<R::Item>,
  F: FnMut(T) -> R + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.stopped.load() {
      return AckFuture::DONE;
    }
    let func = &mut self.func;
    let inner = match guard(move || func(value)) {
      Ok(inner) => inner,
      Err(error) => {
        self.stopped.store(true);
        self.downstream.lock().on_error(error);
        return AckFuture::DONE;
      }
    };
    let (release, ack) = AckPromise::pair();
    let inner_observer = ConcatInnerObserver {
      downstream: Arc::clone(&self.downstream),
      stopped: Arc::clone(&self.stopped),
      release: Arc::new(Mutex::new(Some(release))),
    };
    inner.unsafe_subscribe(Subscriber::new(inner_observer, self.scheduler.clone()));
    ack
  }

  fn on_complete(&mut self) {
    // Only reachable after the last inner finished, per the ack grammar.
    if !self.stopped.swap(true) {
      self.downstream.lock().on_complete();
    }
  }

  fn on_error(&mut self, error: StreamError) {
    if !self.stopped.swap(true) {
      self.downstream.lock().on_error(error);
    }
  }
}

struct ConcatInnerObserver<O> {
  downstream: Arc<Mutex<O>>,
  stopped: Arc<AtomicCell<bool>>,
  // Completing this resumes the outer producer.
  release: Arc<Mutex<Option<AckPromise>>>,
}

impl<O> ConcatInnerObserver<O> {
  fn resume_outer(release: &Mutex<Option<AckPromise>>, ack: Ack) {
    if let Some(promise) = release.lock().take() {
      promise.complete(ack);
    }
  }
}

impl<T, O> Observer<T> for ConcatInnerObserver<O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.stopped.load() {
      Self::resume_outer(&self.release, Ack::Done);
      return AckFuture::DONE;
    }
    match self.downstream.lock().on_next(value) {
      AckFuture::Ready(Ack::Continue) => AckFuture::CONTINUE,
      AckFuture::Ready(Ack::Done) => {
        self.stopped.store(true);
        Self::resume_outer(&self.release, Ack::Done);
        AckFuture::DONE
      }
      AckFuture::Pending(future) => {
        let stopped = Arc::clone(&self.stopped);
        let release = Arc::clone(&self.release);
        AckFuture::pending(async move {
          let ack = future.await;
          if ack.is_done() {
            stopped.store(true);
            Self::resume_outer(&release, Ack::Done);
          }
          ack
        })
      }
    }
  }

  fn on_complete(&mut self) {
    Self::resume_outer(&self.release, Ack::Continue);
  }

  fn on_error(&mut self, error: StreamError) {
    if !self.stopped.swap(true) {
      self.downstream.lock().on_error(error);
    }
    Self::resume_outer(&self.release, Ack::Done);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::{from_seq, range, unit};
  use crate::ops::into_future::AsFuture;
  use crate::ops::map::Map;
  use crate::ops::reduce::Fold;
  use futures::executor::{block_on, ThreadPool};

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  fn collect<S: Observable>(source: S) -> Vec<S::Item> {
    block_on(
      source
        .fold(Vec::new(), |mut acc, v| {
          acc.push(v);
          acc
        })
        .as_future(scheduler()),
    )
    .unwrap()
    .unwrap_or_default()
  }

  #[test]
  fn inner_streams_play_out_in_order() {
    let flattened = collect(range(0, 3).concat_map(|v| from_seq(vec![v * 10, v * 10 + 1])));
    assert_eq!(flattened, vec![0, 1, 10, 11, 20, 21]);
  }

  #[test]
  fn map_then_flatten_equals_flat_map() {
    let mapped = collect(range(0, 4).map(|v| range(v, v + 2)).flatten());
    let flat = collect(range(0, 4).flat_map(|v| range(v, v + 2)));
    assert_eq!(mapped, flat);
  }

  #[test]
  fn flat_map_over_unit_is_map() {
    let flat = collect(range(0, 5).flat_map(|v| unit(v + 1)));
    let mapped = collect(range(0, 5).map(|v| v + 1));
    assert_eq!(flat, mapped);
  }

  #[test]
  fn failing_mapper_fails_the_stream() {
    let result = block_on(
      range(0, 10)
        .concat_map(|v| {
          if v == 2 {
            panic!("no inner for you");
          }
          unit(v)
        })
        .fold(Vec::new(), |mut acc, v| {
          acc.push(v);
          acc
        })
        .as_future(scheduler()),
    );
    assert!(result.unwrap_err().to_string().contains("no inner for you"));
  }
}

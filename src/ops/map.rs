use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  util::guard,
};

/// Creates a new stream which calls a closure on each element and uses
/// its return as the value. Ordering and back-pressure pass through
/// untouched.
pub trait Map: Observable {
  fn map<B, F>(self, f: F) -> MapOp<Self, F>
  where
    B: Send + 'static,
    F: FnMut(Self::Item) -> B + Send + 'static,
  {
    MapOp { source: self, func: f }
  }
}

impl<S: Observable> Map for S {}

#[derive(Clone)]
pub struct MapOp<S, F> {
  source: S,
  func: F,
}

impl<S, B, F> Observable for MapOp<S, F>
where
  S: Observable,
  B: Send + 'static,
  F: FnMut(S::Item) -> B + Send + 'static,
{
  type Item = B;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<B>,
  {
    let MapOp { source, func } = self;
    source.unsafe_subscribe(
      subscriber.transform(|observer| MapObserver { observer, func, done: false }),
    );
  }
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
  done: bool,
}

impl<O, B, F, T> Observer<T> for MapObserver<O, F>
where
  T: Send + 'static,
  B: Send + 'static,
  O: Observer<B>,
  F: FnMut(T) -> B + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    let func = &mut self.func;
    match guard(move || func(value)) {
      Ok(mapped) => self.observer.on_next(mapped),
      Err(error) => {
        self.done = true;
        self.observer.on_error(error);
        AckFuture::DONE
      }
    }
  }

  fn on_complete(&mut self) {
    if !self.done {
      self.done = true;
      self.observer.on_complete();
    }
  }

  fn on_error(&mut self, error: StreamError) {
    if !self.done {
      self.done = true;
      self.observer.on_error(error);
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::range;
  use crate::ops::into_future::AsFuture;
  use crate::ops::reduce::Fold;
  use crate::scheduler::SchedulerRef;
  use futures::executor::{block_on, ThreadPool};
  use std::sync::Arc;

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  #[test]
  fn maps_every_element() {
    let doubled = block_on(
      range(0, 5)
        .map(|v| v * 2)
        .fold(Vec::new(), |mut acc, v| {
          acc.push(v);
          acc
        })
        .as_future(scheduler()),
    );
    assert_eq!(doubled.unwrap(), Some(vec![0, 2, 4, 6, 8]));
  }

  #[test]
  fn panicking_closure_fails_the_stream_once() {
    let scheduler = scheduler();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let (tx, rx) = futures::channel::oneshot::channel();
    let mut tx = Some(tx);
    range(0, 100)
      .map(|v| if v == 4 { panic!("fifth element") } else { v })
      .subscribe_all(
        move |v| sink.lock().push(v),
        move |e| {
          assert!(e.to_string().contains("fifth element"));
          if let Some(tx) = tx.take() {
            let _ = tx.send(());
          }
        },
        || panic!("must not complete"),
        scheduler,
      );
    block_on(rx).unwrap();
    assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
  }
}

use std::collections::VecDeque;

use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
};

/// Keep a ring buffer of the last `count` elements; when the upstream
/// completes, replay the buffer in order and complete.
pub trait TakeLast: Observable {
  fn take_last(self, count: usize) -> TakeLastOp<Self> {
    TakeLastOp { source: self, count }
  }
}

impl<S: Observable> TakeLast for S {}

#[derive(Clone)]
pub struct TakeLastOp<S> {
  source: S,
  count: usize,
}

impl<S: Observable> Observable for TakeLastOp<S> {
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let TakeLastOp { source, count } = self;
    let scheduler = subscriber.scheduler.clone();
    source.unsafe_subscribe(subscriber.transform(|observer| TakeLastObserver {
      observer: Some(observer),
      buffer: VecDeque::with_capacity(count),
      count,
      scheduler,
    }));
  }
}

pub struct TakeLastObserver<T, O> {
  observer: Option<O>,
  buffer: VecDeque<T>,
  count: usize,
  scheduler: SchedulerRef,
}

impl<T, O> Observer<T> for TakeLastObserver<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.observer.is_none() {
      return AckFuture::DONE;
    }
    if self.count == 0 {
      return AckFuture::CONTINUE;
    }
    if self.buffer.len() == self.count {
      self.buffer.pop_front();
    }
    self.buffer.push_back(value);
    AckFuture::CONTINUE
  }

  fn on_complete(&mut self) {
    if let Some(mut observer) = self.observer.take() {
      let buffer = std::mem::take(&mut self.buffer);
      self.scheduler.execute(Box::pin(async move {
        for value in buffer {
          if observer.on_next(value).await.is_done() {
            return;
          }
        }
        observer.on_complete();
      }));
    }
  }

  fn on_error(&mut self, error: StreamError) {
    if let Some(mut observer) = self.observer.take() {
      observer.on_error(error);
    }
  }
}

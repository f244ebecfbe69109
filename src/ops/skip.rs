use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
};

/// Swallow the first `count` elements, acknowledging them immediately, and
/// forward the rest.
pub trait Skip: Observable {
  fn skip(self, count: usize) -> SkipOp<Self> {
    SkipOp { source: self, count }
  }
}

impl<S: Observable> Skip for S {}

#[derive(Clone)]
pub struct SkipOp<S> {
  source: S,
  count: usize,
}

impl<S: Observable> Observable for SkipOp<S> {
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let SkipOp { source, count } = self;
    source
      .unsafe_subscribe(subscriber.transform(|observer| SkipObserver { observer, remaining: count }));
  }
}

pub struct SkipObserver<O> {
  observer: O,
  remaining: usize,
}

impl<T: Send + 'static, O: Observer<T>> Observer<T> for SkipObserver<O> {
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.remaining > 0 {
      self.remaining -= 1;
      AckFuture::CONTINUE
    } else {
      self.observer.on_next(value)
    }
  }

  fn on_complete(&mut self) {
    self.observer.on_complete();
  }

  fn on_error(&mut self, error: StreamError) {
    self.observer.on_error(error);
  }
}

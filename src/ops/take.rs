use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
};

/// Forward the first `count` elements; after the last one, complete
/// downstream and answer `Done` upstream.
pub trait Take: Observable {
  fn take(self, count: usize) -> TakeOp<Self> {
    TakeOp { source: self, count }
  }
}

impl<S: Observable> Take for S {}

#[derive(Clone)]
pub struct TakeOp<S> {
  source: S,
  count: usize,
}

impl<S: Observable> Observable for TakeOp<S> {
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let TakeOp { source, count } = self;
    if count == 0 {
      let Subscriber { mut observer, .. } = subscriber;
      observer.on_complete();
      return;
    }
    source.unsafe_subscribe(
      subscriber.transform(|observer| TakeObserver { observer, remaining: count, done: false }),
    );
  }
}

pub struct TakeObserver<O> {
  observer: O,
  remaining: usize,
  done: bool,
}

impl<T: Send + 'static, O: Observer<T>> Observer<T> for TakeObserver<O> {
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    self.remaining -= 1;
    if self.remaining == 0 {
      self.done = true;
      let _ = self.observer.on_next(value);
      self.observer.on_complete();
      AckFuture::DONE
    } else {
      self.observer.on_next(value)
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

use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  util::guard,
};

/// Emit the running accumulator once per input; the seed itself is never
/// emitted.
pub trait Scan: Observable {
  fn scan<B, F>(self, seed: B, op: F) -> ScanOp<Self, B, F>
  where
    B: Clone + Send + 'static,
    F: FnMut(B, Self::Item) -> B + Send + 'static,
  {
    ScanOp { source: self, seed, op }
  }
}

impl<S: Observable> Scan for S {}

#[derive(Clone)]
pub struct ScanOp<S, B, F> {
  source: S,
  seed: B,
  op: F,
}

impl<S, B, F> Observable for ScanOp<S, B, F>
where
  S: Observable,
  B: Clone + Send + 'static,
  F: FnMut(B, S::Item) -> B + Send + 'static,
{
  type Item = B;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<B>,
  {
    let ScanOp { source, seed, op } = self;
    source.unsafe_subscribe(
      subscriber.transform(|observer| ScanObserver { observer, acc: seed, op, done: false }),
    );
  }
}

pub struct ScanObserver<O, B, F> {
  observer: O,
  acc: B,
  op: F,
  done: bool,
}

impl<O, B, F, T> Observer<T> for ScanObserver<O, B, F>
where
  T: Send + 'static,
  B: Clone + Send + 'static,
  O: Observer<B>,
  F: FnMut(B, T) -> B + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    let acc = self.acc.clone();
    let op = &mut self.op;
    match guard(move || op(acc, value)) {
      Ok(next) => {
        self.acc = next.clone();
        self.observer.on_next(next)
      }
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

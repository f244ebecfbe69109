use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  util::guard,
};

/// Silent accumulation: `fold` emits a single value at completion, `reduce`
/// does the same seeded by the first element and emits nothing for an empty
/// upstream.
pub trait Fold: Observable {
  fn fold<B, F>(self, seed: B, op: F) -> FoldOp<Self, B, F>
  where
    B: Send + 'static,
    F: FnMut(B, Self::Item) -> B + Send + 'static,
  {
    FoldOp { source: self, seed, op }
  }

  fn reduce<F>(self, op: F) -> ReduceOp<Self, F>
  where
    F: FnMut(Self::Item, Self::Item) -> Self::Item + Send + 'static,
  {
    ReduceOp { source: self, op }
  }
}

impl<S: Observable> Fold for S {}

#[derive(Clone)]
pub struct FoldOp<S, B, F> {
  source: S,
  seed: B,
  op: F,
}

impl<S, B, F> Observable for FoldOp<S, B, F>
where
  S: Observable,
  B: Send + 'static,
  F: FnMut(B, S::Item) -> B + Send + 'static,
{
  type Item = B;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<B>,
  {
    let FoldOp { source, seed, op } = self;
    source.unsafe_subscribe(
      subscriber.transform(|observer| FoldObserver { observer, acc: Some(seed), op, done: false }),
    );
  }
}

pub struct FoldObserver<O, B, F> {
  observer: O,
  acc: Option<B>,
  op: F,
  done: bool,
}

impl<O, B, F, T> Observer<T> for FoldObserver<O, B, F>
where
  T: Send + 'static,
  B: Send + 'static,
  O: Observer<B>,
  F: FnMut(B, T) -> B + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    let acc = self.acc.take();
    let op = &mut self.op;
    match guard(move || acc.map(|acc| op(acc, value))) {
      Ok(next) => {
        self.acc = next;
        AckFuture::CONTINUE
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
      if let Some(acc) = self.acc.take() {
        let _ = self.observer.on_next(acc);
      }
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

#[derive(Clone)]
pub struct ReduceOp<S, F> {
  source: S,
  op: F,
}

impl<S, F> Observable for ReduceOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item, S::Item) -> S::Item + Send + 'static,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let ReduceOp { source, op } = self;
    source.unsafe_subscribe(
      subscriber.transform(|observer| ReduceObserver { observer, acc: None, op, done: false }),
    );
  }
}

pub struct ReduceObserver<T, O, F> {
  observer: O,
  acc: Option<T>,
  op: F,
  done: bool,
}

impl<T, O, F> Observer<T> for ReduceObserver<T, O, F>
where
  T: Send + 'static,
  O: Observer<T>,
  F: FnMut(T, T) -> T + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    match self.acc.take() {
      None => {
        self.acc = Some(value);
        AckFuture::CONTINUE
      }
      Some(acc) => {
        let op = &mut self.op;
        match guard(move || op(acc, value)) {
          Ok(next) => {
            self.acc = Some(next);
            AckFuture::CONTINUE
          }
          Err(error) => {
            self.done = true;
            self.observer.on_error(error);
            AckFuture::DONE
          }
        }
      }
    }
  }

  fn on_complete(&mut self) {
    if !self.done {
      self.done = true;
      if let Some(acc) = self.acc.take() {
        let _ = self.observer.on_next(acc);
      }
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

use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  util::guard,
};

/// Forward while the predicate holds; on the first failure, complete
/// downstream and stop the upstream.
pub trait TakeWhile: Observable {
  fn take_while<P>(self, predicate: P) -> TakeWhileOp<Self, P>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
  {
    TakeWhileOp { source: self, predicate }
  }
}

impl<S: Observable> TakeWhile for S {}

#[derive(Clone)]
pub struct TakeWhileOp<S, P> {
  source: S,
  predicate: P,
}

impl<S, P> Observable for TakeWhileOp<S, P>
where
  S: Observable,
  P: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let TakeWhileOp { source, predicate } = self;
    source.unsafe_subscribe(
      subscriber.transform(|observer| TakeWhileObserver { observer, predicate, done: false }),
    );
  }
}

pub struct TakeWhileObserver<O, P> {
  observer: O,
  predicate: P,
  done: bool,
}

impl<T, O, P> Observer<T> for TakeWhileObserver<O, P>
where
  T: Send + 'static,
  O: Observer<T>,
  P: FnMut(&T) -> bool + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    let predicate = &mut self.predicate;
    match guard(|| predicate(&value)) {
      Ok(true) => self.observer.on_next(value),
      Ok(false) => {
        self.done = true;
        self.observer.on_complete();
        AckFuture::DONE
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

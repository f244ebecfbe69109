use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  util::guard,
};

/// Forward only the elements the predicate holds for; dropped elements are
/// acknowledged with `Continue` immediately.
pub trait Filter: Observable {
  fn filter<P>(self, predicate: P) -> FilterOp<Self, P>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
  {
    FilterOp { source: self, predicate }
  }
}

impl<S: Observable> Filter for S {}

#[derive(Clone)]
pub struct FilterOp<S, P> {
  source: S,
  predicate: P,
}

impl<S, P> Observable for FilterOp<S, P>
where
  S: Observable,
  P: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let FilterOp { source, predicate } = self;
    source.unsafe_subscribe(
      subscriber.transform(|observer| FilterObserver { observer, predicate, done: false }),
    );
  }
}

pub struct FilterObserver<O, P> {
  observer: O,
  predicate: P,
  done: bool,
}

impl<T, O, P> Observer<T> for FilterObserver<O, P>
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
      Ok(false) => AckFuture::CONTINUE,
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

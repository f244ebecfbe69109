use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  util::guard,
};

/// Swallow elements until the predicate first fails, then forward
/// everything, including the element that failed it.
pub trait SkipWhile: Observable {
  fn skip_while<P>(self, predicate: P) -> SkipWhileOp<Self, P>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
  {
    SkipWhileOp { source: self, predicate }
  }
}

impl<S: Observable> SkipWhile for S {}

#[derive(Clone)]
pub struct SkipWhileOp<S, P> {
  source: S,
  predicate: P,
}

impl<S, P> Observable for SkipWhileOp<S, P>
where
  S: Observable,
  P: FnMut(&S::Item) -> bool + Send + 'static,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let SkipWhileOp { source, predicate } = self;
    source.unsafe_subscribe(subscriber.transform(|observer| SkipWhileObserver {
      observer,
      predicate,
      skipping: true,
      done: false,
    }));
  }
}

pub struct SkipWhileObserver<O, P> {
  observer: O,
  predicate: P,
  skipping: bool,
  done: bool,
}

impl<T, O, P> Observer<T> for SkipWhileObserver<O, P>
where
  T: Send + 'static,
  O: Observer<T>,
  P: FnMut(&T) -> bool + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    if self.skipping {
      let predicate = &mut self.predicate;
      match guard(|| predicate(&value)) {
        Ok(true) => return AckFuture::CONTINUE,
        Ok(false) => self.skipping = false,
        Err(error) => {
          self.done = true;
          self.observer.on_error(error);
          return AckFuture::DONE;
        }
      }
    }
    self.observer.on_next(value)
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

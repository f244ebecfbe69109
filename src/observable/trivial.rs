use std::marker::PhantomData;

use crate::{error::StreamError, observable::Observable, observer::Observer, subscriber::Subscriber};

/// Completes immediately without emitting.
pub fn empty<T: Send + 'static>() -> Empty<T> {
  Empty(PhantomData)
}

pub struct Empty<T>(PhantomData<fn() -> T>);

impl<T: Send + 'static> Observable for Empty<T> {
  type Item = T;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<T>,
  {
    let Subscriber { mut observer, .. } = subscriber;
    observer.on_complete();
  }
}

/// Never emits and never terminates.
pub fn never<T: Send + 'static>() -> Never<T> {
  Never(PhantomData)
}

pub struct Never<T>(PhantomData<fn() -> T>);

impl<T: Send + 'static> Observable for Never<T> {
  type Item = T;

  fn unsafe_subscribe<O>(self, _subscriber: Subscriber<O>)
  where
    O: Observer<T>,
  {
  }
}

/// Emits exactly one value, then completes.
pub fn unit<T: Send + 'static>(value: T) -> Unit<T> {
  Unit(value)
}

pub struct Unit<T>(T);

impl<T: Send + 'static> Observable for Unit<T> {
  type Item = T;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<T>,
  {
    let Subscriber { mut observer, .. } = subscriber;
    let _ = observer.on_next(self.0);
    observer.on_complete();
  }
}

/// Fails immediately with the given error.
pub fn error<T: Send + 'static>(error: StreamError) -> Throw<T> {
  Throw(error, PhantomData)
}

pub struct Throw<T>(StreamError, PhantomData<fn() -> T>);

impl<T: Send + 'static> Observable for Throw<T> {
  type Item = T;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<T>,
  {
    let Subscriber { mut observer, .. } = subscriber;
    observer.on_error(self.0);
  }
}

/// Emits clones of `value` as fast as the consumer acknowledges them,
/// forever. Pair with `take` or a consumer that eventually answers `Done`.
pub fn continuous<T: Clone + Send + 'static>(value: T) -> Continuous<T> {
  Continuous(value)
}

pub struct Continuous<T>(T);

impl<T: Clone + Send + 'static> Observable for Continuous<T> {
  type Item = T;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<T>,
  {
    let Subscriber { mut observer, scheduler } = subscriber;
    let value = self.0;
    scheduler.execute(Box::pin(async move {
      loop {
        if observer.on_next(value.clone()).await.is_done() {
          return;
        }
      }
    }));
  }
}

use std::marker::PhantomData;

use crate::{
  observable::Observable,
  observer::{BoxObserver, Observer},
  subscriber::Subscriber,
};

/// Create an observable from a raw subscribe function.
///
/// The function receives the subscriber (observer plus scheduler) and is
/// responsible for honoring the grammar: await every ack, stop on `Done`,
/// emit at most one terminal event. A panic inside the function is routed
/// to `on_error` by the safe `subscribe*` entry points.
pub fn create<T, F>(subscribe_fn: F) -> ObservableFromFn<F, T>
where
  T: Send + 'static,
  F: FnOnce(Subscriber<BoxObserver<T>>) + Send + 'static,
{
  ObservableFromFn { subscribe_fn, _marker: PhantomData }
}

pub struct ObservableFromFn<F, T> {
  subscribe_fn: F,
  _marker: PhantomData<fn() -> T>,
}

impl<F, T> Observable for ObservableFromFn<F, T>
where
  T: Send + 'static,
  F: FnOnce(Subscriber<BoxObserver<T>>) + Send + 'static,
{
  type Item = T;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<T>,
  {
    let Subscriber { observer, scheduler } = subscriber;
    (self.subscribe_fn)(Subscriber::new(Box::new(observer), scheduler));
  }
}

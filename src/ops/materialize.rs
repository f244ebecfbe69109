use crate::{
  ack::AckFuture,
  error::StreamError,
  notification::Notification,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
};

/// Reify events as [`Notification`] values: terminal events become ordinary
/// items followed by a completion.
pub trait Materialize: Observable {
  fn materialize(self) -> MaterializeOp<Self> {
    MaterializeOp { source: self }
  }
}

impl<S: Observable> Materialize for S {}

#[derive(Clone)]
pub struct MaterializeOp<S> {
  source: S,
}

impl<S: Observable> Observable for MaterializeOp<S> {
  type Item = Notification<S::Item>;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<Notification<S::Item>>,
  {
    self
      .source
      .unsafe_subscribe(subscriber.transform(|observer| MaterializeObserver { observer }));
  }
}

pub struct MaterializeObserver<O> {
  observer: O,
}

impl<O, T> Observer<T> for MaterializeObserver<O>
where
  T: Send + 'static,
  O: Observer<Notification<T>>,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    self.observer.on_next(Notification::OnNext(value))
  }

  fn on_complete(&mut self) {
    let _ = self.observer.on_next(Notification::OnComplete);
    self.observer.on_complete();
  }

  fn on_error(&mut self, error: StreamError) {
    let _ = self.observer.on_next(Notification::OnError(error));
    self.observer.on_complete();
  }
}

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  ack::AckFuture,
  cancelable::{BooleanCancelable, Cancelable},
  error::StreamError,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
};

/// A multicast observable whose shared production begins only when
/// `connect()` is called.
///
/// Subscribers attach to the subject side at any time via [`fork`];
/// `connect` subscribes the subject to the source exactly once and returns
/// a gate that forces `Done` to the source when canceled.
///
/// [`fork`]: ConnectableObservable::fork
pub struct ConnectableObservable<S, Sub> {
  inner: Arc<ConnInner<S, Sub>>,
}

struct ConnInner<S, Sub> {
  source: Mutex<Option<S>>,
  subject: Sub,
  gate: Mutex<Option<Arc<BooleanCancelable>>>,
}

impl<S, Sub> ConnectableObservable<S, Sub>
where
  S: Observable,
  Sub: Observer<S::Item> + Observable<Item = S::Item> + Clone,
{
  pub fn new(source: S, subject: Sub) -> Self {
    ConnectableObservable {
      inner: Arc::new(ConnInner {
        source: Mutex::new(Some(source)),
        subject,
        gate: Mutex::new(None),
      }),
    }
  }

  /// The observable side; every call hands out a fresh subscription handle
  /// to the shared production.
  pub fn fork(&self) -> Sub {
    self.inner.subject.clone()
  }

  /// Begin the shared production. Idempotent: later calls return the same
  /// gate. Canceling the gate answers `Done` to the source's next emission.
  pub fn connect(&self, scheduler: SchedulerRef) -> Arc<BooleanCancelable> {
    let gate = {
      let mut slot = self.inner.gate.lock();
      match slot.as_ref() {
        Some(existing) => return Arc::clone(existing),
        None => {
          let gate = Arc::new(BooleanCancelable::new());
          *slot = Some(Arc::clone(&gate));
          gate
        }
      }
    };
    if let Some(source) = self.inner.source.lock().take() {
      let tap = ConnectGate { observer: self.fork(), gate: Arc::clone(&gate) };
      source.unsafe_subscribe(Subscriber::new(tap, scheduler));
    }
    gate
  }
}

impl<S, Sub> Clone for ConnectableObservable<S, Sub> {
  fn clone(&self) -> Self {
    ConnectableObservable { inner: Arc::clone(&self.inner) }
  }
}

impl<S, Sub> Observable for ConnectableObservable<S, Sub>
where
  S: Observable,
  Sub: Observer<S::Item> + Observable<Item = S::Item> + Clone + Sync,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<Self::Item>,
  {
    self.fork().unsafe_subscribe(subscriber);
  }
}

/// Forwards into the subject until the connect gate is canceled.
struct ConnectGate<O> {
  observer: O,
  gate: Arc<BooleanCancelable>,
}

impl<T: Send + 'static, O: Observer<T>> Observer<T> for ConnectGate<O> {
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.gate.is_canceled() {
      return AckFuture::DONE;
    }
    self.observer.on_next(value)
  }

  fn on_complete(&mut self) {
    if !self.gate.is_canceled() {
      self.observer.on_complete();
    }
  }

  fn on_error(&mut self, error: StreamError) {
    if !self.gate.is_canceled() {
      self.observer.on_error(error);
    }
  }
}

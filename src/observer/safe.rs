use std::sync::Arc;

use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::{
  ack::{Ack, AckFuture},
  error::StreamError,
  observer::Observer,
  scheduler::SchedulerRef,
  util::guard,
};

/// Wraps an arbitrary observer and enforces the grammar on its behalf.
///
/// After a terminal event further events are suppressed; a panic raised by
/// the wrapped `on_next` is converted into `on_error`; a panic raised by the
/// wrapped `on_error` goes to the scheduler's failure reporter, since there
/// is no stream left to carry it.
pub struct SafeObserver<O> {
  inner: Arc<SafeInner<O>>,
}

struct SafeInner<O> {
  observer: Mutex<O>,
  done: AtomicCell<bool>,
  scheduler: SchedulerRef,
}

impl<O> SafeObserver<O> {
  pub fn new(observer: O, scheduler: SchedulerRef) -> Self {
    SafeObserver {
      inner: Arc::new(SafeInner {
        observer: Mutex::new(observer),
        done: AtomicCell::new(false),
        scheduler,
      }),
    }
  }
}

impl<O: Send + 'static> SafeObserver<O> {
  fn deliver_error<Item>(&self, error: StreamError)
  where
    O: Observer<Item>,
  {
    if !self.inner.done.swap(true) {
      if let Err(panic) = guard(|| self.inner.observer.lock().on_error(error)) {
        self.inner.scheduler.report_failure(panic);
      }
    }
  }

  /// Remember a `Done` resolution so later events are suppressed even if a
  /// misbehaving upstream keeps pushing.
  fn track(&self, ack: AckFuture) -> AckFuture {
    match ack {
      AckFuture::Ready(Ack::Done) => {
        self.inner.done.store(true);
        AckFuture::DONE
      }
      ready @ AckFuture::Ready(_) => ready,
      AckFuture::Pending(future) => {
        let inner = Arc::clone(&self.inner);
        AckFuture::pending(async move {
          let ack = future.await;
          if ack.is_done() {
            inner.done.store(true);
          }
          ack
        })
      }
    }
  }
}

impl<O> Clone for SafeObserver<O> {
  fn clone(&self) -> Self {
    SafeObserver { inner: Arc::clone(&self.inner) }
  }
}

impl<Item, O: Observer<Item>> Observer<Item> for SafeObserver<O> {
  fn on_next(&mut self, value: Item) -> AckFuture {
    if self.inner.done.load() {
      return AckFuture::DONE;
    }
    match guard(|| self.inner.observer.lock().on_next(value)) {
      Ok(ack) => self.track(ack),
      Err(error) => {
        self.deliver_error::<Item>(error);
        AckFuture::DONE
      }
    }
  }

  fn on_complete(&mut self) {
    if !self.inner.done.swap(true) {
      if let Err(panic) = guard(|| self.inner.observer.lock().on_complete()) {
        self.inner.scheduler.report_failure(panic);
      }
    }
  }

  fn on_error(&mut self, error: StreamError) {
    self.deliver_error::<Item>(error);
  }
}

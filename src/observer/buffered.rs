use std::{collections::VecDeque, sync::Arc};

use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::{
  ack::AckFuture,
  error::StreamError,
  observer::Observer,
  scheduler::SchedulerRef,
};

/// Absorbs producer pushes without back-pressure.
///
/// `on_next` enqueues, makes sure a drain task is running, and returns
/// `Continue` synchronously; the drain pops items one at a time, awaiting
/// the downstream ack between them, and stops on `Done` or a terminal.
/// Terminal events travel through the queue as sentinels, so they observe
/// FIFO order.
///
/// The queue is unbounded: a producer that outruns its consumer grows it
/// without limit. Callers who need a bound must enforce one upstream.
pub struct BufferedObserver<T, O> {
  inner: Arc<BufferedInner<T, O>>,
}

enum Envelope<T> {
  Item(T),
  Complete,
  Error(StreamError),
}

struct BufferedInner<T, O> {
  queue: Mutex<VecDeque<Envelope<T>>>,
  draining: AtomicCell<bool>,
  stopped: AtomicCell<bool>,
  observer: Mutex<O>,
  scheduler: SchedulerRef,
}

impl<T, O> BufferedObserver<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  pub fn new(observer: O, scheduler: SchedulerRef) -> Self {
    BufferedObserver {
      inner: Arc::new(BufferedInner {
        queue: Mutex::new(VecDeque::new()),
        draining: AtomicCell::new(false),
        stopped: AtomicCell::new(false),
        observer: Mutex::new(observer),
        scheduler,
      }),
    }
  }

  fn push(&self, envelope: Envelope<T>) {
    if self.inner.stopped.load() {
      return;
    }
    self.inner.queue.lock().push_back(envelope);
    BufferedInner::ensure_draining(&self.inner);
  }
}

impl<T, O> Clone for BufferedObserver<T, O> {
  fn clone(&self) -> Self {
    BufferedObserver { inner: Arc::clone(&self.inner) }
  }
}

impl<T, O> BufferedInner<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  fn ensure_draining(inner: &Arc<Self>) {
    if inner.draining.compare_exchange(false, true).is_ok() {
      let inner = Arc::clone(inner);
      let scheduler = inner.scheduler.clone();
      scheduler.execute(Box::pin(async move {
        Self::drain(inner).await;
      }));
    }
  }

  async fn drain(inner: Arc<Self>) {
    loop {
      let next = inner.queue.lock().pop_front();
      match next {
        None => {
          inner.draining.store(false);
          // A producer may have enqueued between the pop and the store;
          // retake the drain or leave it to the racing producer's task.
          if inner.queue.lock().is_empty() || inner.stopped.load() {
            return;
          }
          if inner.draining.compare_exchange(false, true).is_err() {
            return;
          }
        }
        Some(Envelope::Item(value)) => {
          if inner.stopped.load() {
            return;
          }
          let ack = inner.observer.lock().on_next(value);
          if ack.await.is_done() {
            inner.stopped.store(true);
            return;
          }
        }
        Some(Envelope::Complete) => {
          inner.stopped.store(true);
          inner.observer.lock().on_complete();
          return;
        }
        Some(Envelope::Error(error)) => {
          inner.stopped.store(true);
          inner.observer.lock().on_error(error);
          return;
        }
      }
    }
  }
}

impl<T, O> Observer<T> for BufferedObserver<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.inner.stopped.load() {
      return AckFuture::DONE;
    }
    self.push(Envelope::Item(value));
    AckFuture::CONTINUE
  }

  fn on_complete(&mut self) {
    self.push(Envelope::Complete);
  }

  fn on_error(&mut self, error: StreamError) {
    self.push(Envelope::Error(error));
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observer::LambdaObserver;
  use futures::channel::oneshot;
  use futures::executor::{block_on, ThreadPool};
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  #[test]
  fn drains_in_fifo_order() {
    let (tx, rx) = oneshot::channel();
    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let mut tx = Some(tx);
    let mut buffered = BufferedObserver::new(
      LambdaObserver::new(
        move |v: i32| sink.lock().push(v),
        |_| {},
        move || {
          if let Some(tx) = tx.take() {
            let _ = tx.send(());
          }
        },
      ),
      scheduler(),
    );
    for i in 0..100 {
      assert!(buffered.on_next(i).as_ready().is_some());
    }
    buffered.on_complete();
    block_on(rx).unwrap();
    assert_eq!(*collected.lock(), (0..100).collect::<Vec<_>>());
  }

  #[test]
  fn terminal_keeps_queue_order() {
    let (tx, rx) = oneshot::channel();
    let seen = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&seen);
    let mut tx = Some(tx);
    let mut buffered = BufferedObserver::new(
      LambdaObserver::new(
        move |_: i32| {
          counted.fetch_add(1, Ordering::SeqCst);
        },
        |_| {},
        move || {
          if let Some(tx) = tx.take() {
            let _ = tx.send(());
          }
        },
      ),
      scheduler(),
    );
    let _ = buffered.on_next(1);
    let _ = buffered.on_next(2);
    buffered.on_complete();
    block_on(rx).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn done_from_downstream_stops_the_drain() {
    struct TakeOne {
      tx: Option<oneshot::Sender<()>>,
    }
    impl Observer<i32> for TakeOne {
      fn on_next(&mut self, _: i32) -> AckFuture {
        if let Some(tx) = self.tx.take() {
          let _ = tx.send(());
        }
        AckFuture::DONE
      }
      fn on_complete(&mut self) {}
      fn on_error(&mut self, _: StreamError) {}
    }
    let (tx, rx) = oneshot::channel();
    let mut buffered = BufferedObserver::new(TakeOne { tx: Some(tx) }, scheduler());
    let _ = buffered.on_next(1);
    block_on(rx).unwrap();
    // Give the drain a moment to observe the Done and stop.
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(buffered.on_next(2).as_ready(), Some(crate::ack::Ack::Done));
  }
}

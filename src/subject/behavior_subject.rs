use std::sync::Arc;

use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subject::subject_core::{Cache, SubjectCore},
  subscriber::Subscriber,
};

/// Caches the most recently emitted value (or the initial one); every new
/// subscriber receives that single cached value first, then live events.
pub struct BehaviorSubject<T> {
  core: Arc<SubjectCore<T>>,
}

impl<T: Clone + Send + Sync + 'static> BehaviorSubject<T> {
  pub fn new(initial: T) -> Self {
    BehaviorSubject { core: SubjectCore::new(Cache::Latest(Some(initial))) }
  }
}

impl<T> Clone for BehaviorSubject<T> {
  fn clone(&self) -> Self {
    BehaviorSubject { core: Arc::clone(&self.core) }
  }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for BehaviorSubject<T> {
  fn on_next(&mut self, value: T) -> AckFuture {
    self.core.push_next(value)
  }

  fn on_complete(&mut self) {
    self.core.terminate(None);
  }

  fn on_error(&mut self, error: StreamError) {
    self.core.terminate(Some(error));
  }
}

impl<T: Clone + Send + Sync + 'static> Observable for BehaviorSubject<T> {
  type Item = T;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<T>,
  {
    let Subscriber { observer, scheduler } = subscriber;
    self.core.subscribe(Box::new(observer), scheduler);
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::scheduler::SchedulerRef;
  use futures::channel::oneshot;
  use futures::executor::{block_on, ThreadPool};
  use parking_lot::Mutex;

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  #[test]
  fn subscribers_start_from_the_current_value() {
    let scheduler = scheduler();
    let mut subject = BehaviorSubject::new(42);

    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);
    subject.clone().subscribe_all(
      move |v| sink.lock().push(v),
      |_| {},
      move || {
        if let Some(tx) = tx.take() {
          let _ = tx.send(());
        }
      },
      scheduler,
    );

    let _ = block_on(subject.on_next(100));
    let _ = block_on(subject.on_next(200));
    subject.on_complete();
    block_on(rx).unwrap();
    assert_eq!(*collected.lock(), vec![42, 100, 200]);
  }

  #[test]
  fn late_subscribers_see_the_latest_value() {
    let scheduler = scheduler();
    let mut subject = BehaviorSubject::new(1);
    let _ = block_on(subject.on_next(7));

    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);
    subject.clone().subscribe_all(
      move |v| sink.lock().push(v),
      |_| {},
      move || {
        if let Some(tx) = tx.take() {
          let _ = tx.send(());
        }
      },
      scheduler,
    );
    subject.on_complete();
    block_on(rx).unwrap();
    assert_eq!(*collected.lock(), vec![7]);
  }
}

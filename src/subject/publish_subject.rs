use std::sync::Arc;

use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subject::subject_core::{Cache, SubjectCore},
  subscriber::Subscriber,
};

/// Broadcasts live events and caches nothing: a subscriber sees only what
/// is emitted after it subscribed.
pub struct PublishSubject<T> {
  core: Arc<SubjectCore<T>>,
}

impl<T: Clone + Send + Sync + 'static> PublishSubject<T> {
  pub fn new() -> Self {
    PublishSubject { core: SubjectCore::new(Cache::None) }
  }

  pub fn subscriber_count(&self) -> usize {
    self.core.subscriber_count()
  }
}

impl<T: Clone + Send + Sync + 'static> Default for PublishSubject<T> {
  fn default() -> Self {
    PublishSubject::new()
  }
}

impl<T> Clone for PublishSubject<T> {
  fn clone(&self) -> Self {
    PublishSubject { core: Arc::clone(&self.core) }
  }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for PublishSubject<T> {
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

impl<T: Clone + Send + Sync + 'static> Observable for PublishSubject<T> {
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
  use crate::ack::Ack;
  use crate::scheduler::SchedulerRef;
  use futures::channel::oneshot;
  use futures::executor::{block_on, ThreadPool};
  use parking_lot::Mutex;

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  #[test]
  fn late_subscribers_miss_earlier_events() {
    let scheduler = scheduler();
    let mut subject = PublishSubject::new();
    let _ = block_on(subject.on_next(1));

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

    let _ = block_on(subject.on_next(2));
    let _ = block_on(subject.on_next(3));
    subject.on_complete();
    block_on(rx).unwrap();
    assert_eq!(*collected.lock(), vec![2, 3]);
  }

  #[test]
  fn pushes_after_complete_answer_done() {
    let mut subject = PublishSubject::new();
    subject.on_complete();
    assert_eq!(block_on(subject.on_next(1)), Ack::Done);
  }

  #[test]
  fn done_subscribers_are_removed() {
    let scheduler = scheduler();
    let mut subject = PublishSubject::new();
    // An as_future subscriber takes one element and answers Done.
    use crate::ops::into_future::AsFuture;
    let first = subject.clone().as_future(scheduler);
    assert_eq!(subject.subscriber_count(), 1);
    let _ = block_on(subject.on_next(10));
    assert_eq!(block_on(first).unwrap(), Some(10));
    assert_eq!(subject.subscriber_count(), 0);
  }
}

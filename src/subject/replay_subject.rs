use std::sync::Arc;

use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  subject::subject_core::{Cache, SubjectCore},
  subscriber::Subscriber,
};

/// Caches every item ever emitted; a new subscriber receives the full
/// history first, then live events. The history survives completion, so
/// even post-terminal subscribers get the whole stream.
pub struct ReplaySubject<T> {
  core: Arc<SubjectCore<T>>,
}

impl<T: Clone + Send + Sync + 'static> ReplaySubject<T> {
  pub fn new() -> Self {
    ReplaySubject { core: SubjectCore::new(Cache::All(Vec::new())) }
  }
}

impl<T: Clone + Send + Sync + 'static> Default for ReplaySubject<T> {
  fn default() -> Self {
    ReplaySubject::new()
  }
}

impl<T> Clone for ReplaySubject<T> {
  fn clone(&self) -> Self {
    ReplaySubject { core: Arc::clone(&self.core) }
  }
}

impl<T: Clone + Send + Sync + 'static> Observer<T> for ReplaySubject<T> {
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

impl<T: Clone + Send + Sync + 'static> Observable for ReplaySubject<T> {
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

  fn subscribe_collecting(
    subject: &ReplaySubject<i32>,
    scheduler: SchedulerRef,
  ) -> (Arc<Mutex<Vec<i32>>>, oneshot::Receiver<()>) {
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
    (collected, rx)
  }

  #[test]
  fn history_then_live_events() {
    let scheduler = scheduler();
    let mut subject = ReplaySubject::new();
    let _ = block_on(subject.on_next(1));
    let _ = block_on(subject.on_next(2));
    let _ = block_on(subject.on_next(3));

    let (collected, done) = subscribe_collecting(&subject, scheduler);
    let _ = block_on(subject.on_next(4));
    subject.on_complete();
    block_on(done).unwrap();
    assert_eq!(*collected.lock(), vec![1, 2, 3, 4]);
  }

  #[test]
  fn subscribers_after_completion_get_everything() {
    let scheduler = scheduler();
    let mut subject = ReplaySubject::new();
    let _ = block_on(subject.on_next(5));
    let _ = block_on(subject.on_next(6));
    subject.on_complete();

    let (collected, done) = subscribe_collecting(&subject, scheduler);
    block_on(done).unwrap();
    assert_eq!(*collected.lock(), vec![5, 6]);
  }
}

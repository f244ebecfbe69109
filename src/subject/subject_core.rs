use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
  ack::{Ack, AckFuture},
  atomic::Atomic,
  error::StreamError,
  observer::{BoxObserver, ConnectableObserver, Observer},
  scheduler::SchedulerRef,
};

/// What a subject hands to late subscribers.
#[derive(Clone)]
pub(crate) enum Cache<T> {
  /// Publish: live events only.
  None,
  /// Behavior: the most recent value.
  Latest(Option<T>),
  /// Replay: everything ever emitted.
  All(Vec<T>),
}

impl<T: Clone> Cache<T> {
  fn record(&self, value: &T) -> Cache<T> {
    match self {
      Cache::None => Cache::None,
      Cache::Latest(_) => Cache::Latest(Some(value.clone())),
      Cache::All(history) => {
        let mut history = history.clone();
        history.push(value.clone());
        Cache::All(history)
      }
    }
  }

  fn items(&self) -> Vec<T> {
    match self {
      Cache::None => Vec::new(),
      Cache::Latest(latest) => latest.clone().into_iter().collect(),
      Cache::All(history) => history.clone(),
    }
  }
}

type Entry<T> = ConnectableObserver<T, BoxObserver<T>>;
type Subscribers<T> = SmallVec<[Entry<T>; 2]>;

/// Subject state. Transitions are monotonic: Empty goes to Active or
/// Complete, Active goes to Complete, Complete is terminal.
#[derive(Clone)]
pub(crate) enum SubjectState<T> {
  Empty { cache: Cache<T> },
  Active { subscribers: Subscribers<T>, cache: Cache<T> },
  Complete { cache: Cache<T>, error: Option<StreamError> },
}

/// The shared state machine behind every subject flavor: a single atomic
/// cell updated by CAS retry loops, no locks on the emission path.
pub(crate) struct SubjectCore<T> {
  state: Atomic<SubjectState<T>>,
}

enum FanOut<T> {
  Idle,
  Deliver(Subscribers<T>),
  Stopped,
}

impl<T: Clone + Send + Sync + 'static> SubjectCore<T> {
  pub(crate) fn new(cache: Cache<T>) -> Arc<Self> {
    Arc::new(SubjectCore { state: Atomic::new(SubjectState::Empty { cache }) })
  }

  /// Ingest one item: record it in the cache and fan it out. The returned
  /// ack is the conjunction of every subscriber's ack, so the producer
  /// is suspended until the slowest subscriber is ready.
  pub(crate) fn push_next(self: &Arc<Self>, value: T) -> AckFuture {
    let fan_out = self.state.transform_and_extract(|state| match state {
      SubjectState::Empty { cache } => {
        (SubjectState::Empty { cache: cache.record(&value) }, FanOut::Idle)
      }
      SubjectState::Active { subscribers, cache } => (
        SubjectState::Active { subscribers: subscribers.clone(), cache: cache.record(&value) },
        FanOut::Deliver(subscribers.clone()),
      ),
      complete @ SubjectState::Complete { .. } => (complete.clone(), FanOut::Stopped),
    });
    match fan_out {
      FanOut::Stopped => AckFuture::DONE,
      FanOut::Idle => AckFuture::CONTINUE,
      FanOut::Deliver(subscribers) => self.deliver(subscribers, value),
    }
  }

  fn deliver(self: &Arc<Self>, subscribers: Subscribers<T>, value: T) -> AckFuture {
    let mut gone: Vec<Entry<T>> = Vec::new();
    let mut pending: Vec<(Entry<T>, AckFuture)> = Vec::new();
    for entry in subscribers {
      let ack = entry.clone().on_next(value.clone());
      match ack.as_ready() {
        Some(Ack::Continue) => {}
        Some(Ack::Done) => gone.push(entry),
        None => pending.push((entry, ack)),
      }
    }
    if !gone.is_empty() {
      self.remove(&gone);
    }
    if pending.is_empty() {
      return AckFuture::CONTINUE;
    }
    let core = Arc::clone(self);
    AckFuture::pending(async move {
      let mut gone: Vec<Entry<T>> = Vec::new();
      for (entry, ack) in pending {
        if ack.await.is_done() {
          gone.push(entry);
        }
      }
      if !gone.is_empty() {
        core.remove(&gone);
      }
      Ack::Continue
    })
  }

  /// Terminate: every current subscriber sees the terminal event, the
  /// cache is frozen for late subscribers, later pushes answer `Done`.
  pub(crate) fn terminate(self: &Arc<Self>, error: Option<StreamError>) {
    let fan_out = self.state.transform_and_extract(|state| match state {
      SubjectState::Empty { cache } => (
        SubjectState::Complete { cache: cache.clone(), error: error.clone() },
        FanOut::Idle,
      ),
      SubjectState::Active { subscribers, cache } => (
        SubjectState::Complete { cache: cache.clone(), error: error.clone() },
        FanOut::Deliver(subscribers.clone()),
      ),
      complete @ SubjectState::Complete { .. } => (complete.clone(), FanOut::Stopped),
    });
    if let FanOut::Deliver(subscribers) = fan_out {
      for entry in subscribers {
        match &error {
          Some(error) => entry.clone().on_error(error.clone()),
          None => entry.clone().on_complete(),
        }
      }
    }
  }

  /// Register a new subscriber. Cached history is loaded into a
  /// connectable observer before the entry becomes visible, so history and
  /// live events cannot interleave.
  pub(crate) fn subscribe(self: &Arc<Self>, observer: BoxObserver<T>, scheduler: SchedulerRef) {
    let entry = ConnectableObserver::new(observer, scheduler);
    loop {
      let current = self.state.load();
      match &*current {
        SubjectState::Complete { cache, error } => {
          entry.reset_buffer();
          for item in cache.items() {
            entry.push_first(item);
          }
          match error {
            Some(error) => entry.schedule_error(error.clone()),
            None => entry.schedule_complete(),
          }
          entry.connect();
          return;
        }
        SubjectState::Empty { cache } => {
          entry.reset_buffer();
          for item in cache.items() {
            entry.push_first(item);
          }
          let next = SubjectState::Active {
            subscribers: smallvec::smallvec![entry.clone()],
            cache: cache.clone(),
          };
          if self.state.compare_and_set(&current, next) {
            entry.connect();
            return;
          }
        }
        SubjectState::Active { subscribers, cache } => {
          entry.reset_buffer();
          for item in cache.items() {
            entry.push_first(item);
          }
          let mut subscribers = subscribers.clone();
          subscribers.push(entry.clone());
          let next = SubjectState::Active { subscribers, cache: cache.clone() };
          if self.state.compare_and_set(&current, next) {
            entry.connect();
            return;
          }
        }
      }
    }
  }

  /// Drop subscribers that answered `Done`, by identity.
  fn remove(&self, gone: &[Entry<T>]) {
    self.state.transform(|state| match state {
      SubjectState::Active { subscribers, cache } => {
        let subscribers = subscribers
          .iter()
          .filter(|entry| !gone.iter().any(|g| g.same(entry)))
          .cloned()
          .collect();
        SubjectState::Active { subscribers, cache: cache.clone() }
      }
      other => other.clone(),
    });
  }

  pub(crate) fn subscriber_count(&self) -> usize {
    match &*self.state.load() {
      SubjectState::Active { subscribers, .. } => subscribers.len(),
      _ => 0,
    }
  }
}

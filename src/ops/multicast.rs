use crate::{
  observable::{ConnectableObservable, Observable},
  observer::Observer,
  subject::{BehaviorSubject, PublishSubject, ReplaySubject},
};

/// Share one production among many subscribers through a subject.
///
/// The result is connectable: subscribers attach first, `connect()` starts
/// the source exactly once.
pub trait Multicast: Observable {
  fn multicast<Sub>(self, subject: Sub) -> ConnectableObservable<Self, Sub>
  where
    Sub: Observer<Self::Item> + Observable<Item = Self::Item> + Clone,
  {
    ConnectableObservable::new(self, subject)
  }

  /// Multicast live events only.
  fn publish(self) -> ConnectableObservable<Self, PublishSubject<Self::Item>>
  where
    Self::Item: Clone + Sync,
  {
    self.multicast(PublishSubject::new())
  }

  /// Multicast remembering the latest value for late subscribers.
  fn behavior(self, initial: Self::Item) -> ConnectableObservable<Self, BehaviorSubject<Self::Item>>
  where
    Self::Item: Clone + Sync,
  {
    self.multicast(BehaviorSubject::new(initial))
  }

  /// Multicast remembering the full history for late subscribers.
  fn replay(self) -> ConnectableObservable<Self, ReplaySubject<Self::Item>>
  where
    Self::Item: Clone + Sync,
  {
    self.multicast(ReplaySubject::new())
  }
}

impl<S: Observable> Multicast for S {}

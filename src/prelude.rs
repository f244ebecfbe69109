//! Re-exports of everything a stream pipeline needs.

pub use crate::ack::{Ack, AckFuture, AckPromise, SharedAck};
pub use crate::atomic::{Atomic, AtomicLong};
pub use crate::cancelable::{
  BooleanCancelable, Cancelable, CancelableRef, ChildCancelable, CompositeCancelable,
  RefCountCancelable, SingleAssignmentCancelable,
};
pub use crate::error::StreamError;
pub use crate::notification::Notification;
pub use crate::observable;
pub use crate::observable::{
  continuous, create, empty, error, from_iter, from_seq, interval, interval_at, never, range,
  unit, ConnectableObservable, Observable,
};
pub use crate::observer::{
  BoxObserver, BufferedObserver, ConnectableObserver, LambdaObserver, Observer, SafeObserver,
};
pub use crate::ops::{
  AsFuture, Buffered, ConcatAll, ConcatMap, Filter, Fold, Lifecycle, Map, Materialize, Merge,
  MergeAll, MergeMap, Multicast, ObserveOn, Scan, Skip, SkipWhile, SubscribeOn, Take, TakeLast,
  TakeWhile, Zip,
};
pub use crate::scheduler::{Scheduler, SchedulerExt, SchedulerRef};
pub use crate::subject::{BehaviorSubject, PublishSubject, ReplaySubject};
pub use crate::subscriber::Subscriber;

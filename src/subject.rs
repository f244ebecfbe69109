//! Multicast subjects.
//!
//! A subject is both an observer (the ingestion side) and an observable
//! (the subscription side). All three variants share one lock-free state
//! machine; they differ only in what they cache for late subscribers:
//! nothing, the latest value, or the full history.

mod behavior_subject;
mod publish_subject;
mod replay_subject;
mod subject_core;

pub use behavior_subject::BehaviorSubject;
pub use publish_subject::PublishSubject;
pub use replay_subject::ReplaySubject;

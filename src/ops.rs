//! Operator catalogue.
//!
//! Every operator is a small value that, on subscription, installs a
//! forwarding observer upstream. Two rules hold throughout: a failure in a
//! user closure is caught before it can leak upstream (it becomes a local
//! `on_error` plus `Done`), and the upstream `on_next` is never invoked
//! again before the previous acknowledgement resolved to `Continue`.

pub mod buffered;
pub mod concat;
pub mod filter;
pub mod into_future;
pub mod lifecycle;
pub mod map;
pub mod materialize;
pub mod merge;
pub mod multicast;
pub mod observe_on;
pub mod reduce;
pub mod scan;
pub mod skip;
pub mod skip_while;
pub mod subscribe_on;
pub mod take;
pub mod take_last;
pub mod take_while;
pub mod zip;

pub use buffered::Buffered;
pub use concat::{ConcatAll, ConcatMap};
pub use filter::Filter;
pub use into_future::AsFuture;
pub use lifecycle::Lifecycle;
pub use map::Map;
pub use materialize::Materialize;
pub use merge::{Merge, MergeAll, MergeMap};
pub use multicast::Multicast;
pub use observe_on::ObserveOn;
pub use reduce::Fold;
pub use scan::Scan;
pub use skip::Skip;
pub use skip_while::SkipWhile;
pub use subscribe_on::SubscribeOn;
pub use take::Take;
pub use take_last::TakeLast;
pub use take_while::TakeWhile;
pub use zip::Zip;

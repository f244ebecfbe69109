//! Composable asynchronous event streams with end-to-end back-pressure.
//!
//! The protocol is a push/pull hybrid: producers push items downstream, but
//! every [`Observer::on_next`] returns an acknowledgement the producer must
//! await before pushing again. `Continue` asks for more, `Done` cancels the
//! subscription; because the ack may be a future, a slow consumer suspends
//! its producer without blocking a thread.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::executor::{block_on, ThreadPool};
//! use rxflow::prelude::*;
//!
//! let scheduler: SchedulerRef = Arc::new(ThreadPool::new().unwrap());
//! let sum = observable::range(0, 100)
//!   .map(|v| v + 1)
//!   .filter(|v| v % 2 == 0)
//!   .fold(0, |acc, v| acc + v)
//!   .as_future(scheduler);
//! assert_eq!(block_on(sum).unwrap(), Some(2550));
//! ```
//!
//! [`Observer::on_next`]: crate::observer::Observer::on_next

pub mod ack;
pub mod atomic;
pub mod cancelable;
pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
mod util;

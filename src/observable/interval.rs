use std::time::Duration;

use crate::{
  observable::Observable, observer::Observer, subscriber::Subscriber, util::sleep,
};

/// Emit a counter on a fixed cadence, waiting out both the period and the
/// consumer's acknowledgement between ticks. The first tick fires after one
/// period.
pub fn interval(period: Duration) -> Interval {
  interval_at(period, period)
}

/// Like [`interval`], with a separate delay before the first tick.
pub fn interval_at(initial: Duration, period: Duration) -> Interval {
  Interval { initial, period }
}

#[derive(Clone)]
pub struct Interval {
  initial: Duration,
  period: Duration,
}

impl Observable for Interval {
  type Item = u64;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<u64>,
  {
    let Subscriber { mut observer, scheduler } = subscriber;
    let Interval { initial, period } = self;
    scheduler.clone().execute(Box::pin(async move {
      let mut delay = initial;
      let mut tick = 0u64;
      loop {
        sleep(&scheduler, delay).await;
        if observer.on_next(tick).await.is_done() {
          return;
        }
        tick += 1;
        delay = period;
      }
    }));
  }
}

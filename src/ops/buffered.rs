use crate::{
  observable::Observable,
  observer::{BufferedObserver, Observer},
  subscriber::Subscriber,
};

/// Decouple the producer from this point on: pushes are absorbed into an
/// unbounded FIFO and acknowledged with `Continue` immediately, while a
/// single drain task feeds the downstream at its own pace.
pub trait Buffered: Observable {
  fn buffered(self) -> BufferedOp<Self> {
    BufferedOp { source: self }
  }
}

impl<S: Observable> Buffered for S {}

#[derive(Clone)]
pub struct BufferedOp<S> {
  source: S,
}

impl<S: Observable> Observable for BufferedOp<S> {
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let scheduler = subscriber.scheduler.clone();
    self
      .source
      .unsafe_subscribe(subscriber.transform(|observer| BufferedObserver::new(observer, scheduler)));
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::range;
  use crate::ops::into_future::AsFuture;
  use crate::ops::reduce::Fold;
  use crate::scheduler::SchedulerRef;
  use futures::executor::{block_on, ThreadPool};
  use std::sync::Arc;

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  #[test]
  fn order_is_preserved_through_the_buffer() {
    let collected = block_on(
      range(0, 500)
        .buffered()
        .fold(Vec::new(), |mut acc, v| {
          acc.push(v);
          acc
        })
        .as_future(scheduler()),
    );
    assert_eq!(collected.unwrap(), Some((0..500).collect::<Vec<_>>()));
  }
}

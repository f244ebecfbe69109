use crate::{
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
};

/// Defer the subscription itself onto the given scheduler; emissions start
/// from one of its threads instead of the caller's.
pub trait SubscribeOn: Observable {
  fn subscribe_on(self, scheduler: SchedulerRef) -> SubscribeOnOp<Self> {
    SubscribeOnOp { source: self, scheduler }
  }
}

impl<S: Observable> SubscribeOn for S {}

pub struct SubscribeOnOp<S> {
  source: S,
  scheduler: SchedulerRef,
}

impl<S: Observable> Observable for SubscribeOnOp<S> {
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let SubscribeOnOp { source, scheduler } = self;
    scheduler.execute(Box::pin(async move {
      source.unsafe_subscribe(subscriber);
    }));
  }
}

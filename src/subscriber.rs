use crate::scheduler::SchedulerRef;

/// An observer paired with the scheduler its stream runs on.
///
/// Producers spawn their emission loops on the subscriber's scheduler, and
/// operators that need to hop threads or delay work inherit it from here.
pub struct Subscriber<O> {
  pub observer: O,
  pub scheduler: SchedulerRef,
}

impl<O> Subscriber<O> {
  pub fn new(observer: O, scheduler: SchedulerRef) -> Self {
    Subscriber { observer, scheduler }
  }

  /// Swap the observer, keeping the scheduler. Operators wrap their
  /// forwarding observer around the downstream one with this.
  pub fn transform<P>(self, f: impl FnOnce(O) -> P) -> Subscriber<P> {
    Subscriber { observer: f(self.observer), scheduler: self.scheduler }
  }
}

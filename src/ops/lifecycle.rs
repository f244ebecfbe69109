use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
  subscriber::Subscriber,
  util::guard,
};

/// Side-effecting taps on the stream's lifecycle.
///
/// A failure inside `do_on_next` fails the stream; failures inside the
/// terminal callbacks have no stream left to travel on and go to the
/// scheduler's failure reporter instead.
pub trait Lifecycle: Observable {
  fn do_on_next<F>(self, f: F) -> DoOnNextOp<Self, F>
  where
    F: FnMut(&Self::Item) + Send + 'static,
  {
    DoOnNextOp { source: self, func: f }
  }

  fn do_on_complete<F>(self, f: F) -> DoOnCompleteOp<Self, F>
  where
    F: FnOnce() + Send + 'static,
  {
    DoOnCompleteOp { source: self, func: f }
  }

  fn do_on_error<F>(self, f: F) -> DoOnErrorOp<Self, F>
  where
    F: FnOnce(&StreamError) + Send + 'static,
  {
    DoOnErrorOp { source: self, func: f }
  }
}

impl<S: Observable> Lifecycle for S {}

#[derive(Clone)]
pub struct DoOnNextOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> Observable for DoOnNextOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) + Send + 'static,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let DoOnNextOp { source, func } = self;
    source.unsafe_subscribe(
      subscriber.transform(|observer| DoOnNextObserver { observer, func, done: false }),
    );
  }
}

pub struct DoOnNextObserver<O, F> {
  observer: O,
  func: F,
  done: bool,
}

impl<T, O, F> Observer<T> for DoOnNextObserver<O, F>
where
  T: Send + 'static,
  O: Observer<T>,
  F: FnMut(&T) + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.done {
      return AckFuture::DONE;
    }
    let func = &mut self.func;
    match guard(|| func(&value)) {
      Ok(()) => self.observer.on_next(value),
      Err(error) => {
        self.done = true;
        self.observer.on_error(error);
        AckFuture::DONE
      }
    }
  }

  fn on_complete(&mut self) {
    if !self.done {
      self.done = true;
      self.observer.on_complete();
    }
  }

  fn on_error(&mut self, error: StreamError) {
    if !self.done {
      self.done = true;
      self.observer.on_error(error);
    }
  }
}

#[derive(Clone)]
pub struct DoOnCompleteOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> Observable for DoOnCompleteOp<S, F>
where
  S: Observable,
  F: FnOnce() + Send + 'static,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let DoOnCompleteOp { source, func } = self;
    let scheduler = subscriber.scheduler.clone();
    source.unsafe_subscribe(subscriber.transform(|observer| DoOnCompleteObserver {
      observer,
      func: Some(func),
      scheduler,
    }));
  }
}

pub struct DoOnCompleteObserver<O, F> {
  observer: O,
  func: Option<F>,
  scheduler: SchedulerRef,
}

impl<T, O, F> Observer<T> for DoOnCompleteObserver<O, F>
where
  T: Send + 'static,
  O: Observer<T>,
  F: FnOnce() + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    self.observer.on_next(value)
  }

  fn on_complete(&mut self) {
    self.observer.on_complete();
    if let Some(func) = self.func.take() {
      if let Err(error) = guard(func) {
        self.scheduler.report_failure(error);
      }
    }
  }

  fn on_error(&mut self, error: StreamError) {
    self.func.take();
    self.observer.on_error(error);
  }
}

#[derive(Clone)]
pub struct DoOnErrorOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> Observable for DoOnErrorOp<S, F>
where
  S: Observable,
  F: FnOnce(&StreamError) + Send + 'static,
{
  type Item = S::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<S::Item>,
  {
    let DoOnErrorOp { source, func } = self;
    let scheduler = subscriber.scheduler.clone();
    source.unsafe_subscribe(subscriber.transform(|observer| DoOnErrorObserver {
      observer,
      func: Some(func),
      scheduler,
    }));
  }
}

pub struct DoOnErrorObserver<O, F> {
  observer: O,
  func: Option<F>,
  scheduler: SchedulerRef,
}

impl<T, O, F> Observer<T> for DoOnErrorObserver<O, F>
where
  T: Send + 'static,
  O: Observer<T>,
  F: FnOnce(&StreamError) + Send + 'static,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    self.observer.on_next(value)
  }

  fn on_complete(&mut self) {
    self.func.take();
    self.observer.on_complete();
  }

  fn on_error(&mut self, error: StreamError) {
    if let Some(func) = self.func.take() {
      if let Err(panic) = guard(|| func(&error)) {
        self.scheduler.report_failure(panic);
      }
    }
    self.observer.on_error(error);
  }
}

use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::channel::oneshot;

use crate::{
  ack::AckFuture,
  error::StreamError,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerRef,
};

/// Resolve a future with the first item of the stream (`None` for an empty
/// stream), then answer `Done` upstream.
pub trait AsFuture: Observable {
  fn as_future(self, scheduler: SchedulerRef) -> StreamFuture<Self::Item> {
    let (tx, rx) = oneshot::channel();
    self.subscribe_observer(FutureObserver { tx: Some(tx) }, scheduler);
    StreamFuture { rx }
  }
}

impl<S: Observable> AsFuture for S {}

pub struct StreamFuture<T> {
  rx: oneshot::Receiver<Result<Option<T>, StreamError>>,
}

impl<T> Future for StreamFuture<T> {
  type Output = Result<Option<T>, StreamError>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    match Pin::new(&mut self.rx).poll(cx) {
      Poll::Ready(Ok(result)) => Poll::Ready(result),
      Poll::Ready(Err(oneshot::Canceled)) => {
        Poll::Ready(Err(StreamError::msg("stream dropped without a terminal event")))
      }
      Poll::Pending => Poll::Pending,
    }
  }
}

struct FutureObserver<T> {
  tx: Option<oneshot::Sender<Result<Option<T>, StreamError>>>,
}

impl<T: Send + 'static> Observer<T> for FutureObserver<T> {
  fn on_next(&mut self, value: T) -> AckFuture {
    if let Some(tx) = self.tx.take() {
      let _ = tx.send(Ok(Some(value)));
    }
    AckFuture::DONE
  }

  fn on_complete(&mut self) {
    if let Some(tx) = self.tx.take() {
      let _ = tx.send(Ok(None));
    }
  }

  fn on_error(&mut self, error: StreamError) {
    if let Some(tx) = self.tx.take() {
      let _ = tx.send(Err(error));
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::error::StreamError;
  use crate::observable::{empty, error, from_seq};
  use futures::executor::{block_on, ThreadPool};
  use std::sync::Arc;

  fn scheduler() -> SchedulerRef {
    Arc::new(ThreadPool::new().expect("build thread pool"))
  }

  #[test]
  fn resolves_with_the_first_item() {
    assert_eq!(block_on(from_seq(vec![5, 6, 7]).as_future(scheduler())).unwrap(), Some(5));
  }

  #[test]
  fn resolves_empty_for_a_completed_stream() {
    assert_eq!(block_on(empty::<i32>().as_future(scheduler())).unwrap(), None);
  }

  #[test]
  fn resolves_with_the_failure() {
    let failed = block_on(error::<i32>(StreamError::msg("broken")).as_future(scheduler()));
    assert_eq!(failed.unwrap_err().to_string(), "broken");
  }
}

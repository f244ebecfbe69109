//! The back-pressure signal.
//!
//! Every `on_next` returns an acknowledgement the producer must await before
//! delivering the next item. `Continue` requests more data, `Done` cancels
//! the subscription. An acknowledgement is either already resolved or a
//! future; the resolved representation keeps the common synchronous hot path
//! free of allocations.

use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::{
  channel::oneshot,
  future::{BoxFuture, Shared},
  FutureExt,
};

/// Resolved back-pressure signal from a consumer to its producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
  /// Ready for the next item.
  Continue,
  /// Stop producing; the subscription is over.
  Done,
}

impl Ack {
  #[inline]
  pub fn is_done(self) -> bool {
    matches!(self, Ack::Done)
  }
}

/// An acknowledgement that is either immediately available or still in
/// flight. Implements `Future<Output = Ack>` so producers can await it
/// uniformly.
pub enum AckFuture {
  Ready(Ack),
  Pending(BoxFuture<'static, Ack>),
}

impl AckFuture {
  pub const CONTINUE: AckFuture = AckFuture::Ready(Ack::Continue);
  pub const DONE: AckFuture = AckFuture::Ready(Ack::Done);

  pub fn pending(future: impl Future<Output = Ack> + Send + 'static) -> Self {
    AckFuture::Pending(future.boxed())
  }

  /// The resolved ack, if no await is needed.
  #[inline]
  pub fn as_ready(&self) -> Option<Ack> {
    match self {
      AckFuture::Ready(ack) => Some(*ack),
      AckFuture::Pending(_) => None,
    }
  }

  /// Convert into a cheaply cloneable ack for multi-consumer chaining.
  pub fn shared(self) -> SharedAck {
    match self {
      AckFuture::Ready(ack) => SharedAck::Ready(ack),
      AckFuture::Pending(future) => SharedAck::Pending(future.shared()),
    }
  }
}

impl From<Ack> for AckFuture {
  #[inline]
  fn from(ack: Ack) -> Self {
    AckFuture::Ready(ack)
  }
}

impl Future for AckFuture {
  type Output = Ack;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Ack> {
    match &mut *self {
      AckFuture::Ready(ack) => Poll::Ready(*ack),
      AckFuture::Pending(future) => future.as_mut().poll(cx),
    }
  }
}

/// A cloneable acknowledgement, used where a single ack gates several
/// consumers: last-response cells, zip pairing, subject fan-out.
#[derive(Clone)]
pub enum SharedAck {
  Ready(Ack),
  Pending(Shared<BoxFuture<'static, Ack>>),
}

impl SharedAck {
  pub const CONTINUE: SharedAck = SharedAck::Ready(Ack::Continue);
  pub const DONE: SharedAck = SharedAck::Ready(Ack::Done);

  /// The resolved ack, if available without awaiting.
  pub fn as_ready(&self) -> Option<Ack> {
    match self {
      SharedAck::Ready(ack) => Some(*ack),
      SharedAck::Pending(shared) => shared.peek().copied(),
    }
  }

  pub fn into_ack_future(self) -> AckFuture {
    match self {
      SharedAck::Ready(ack) => AckFuture::Ready(ack),
      SharedAck::Pending(shared) => AckFuture::pending(shared),
    }
  }
}

impl Future for SharedAck {
  type Output = Ack;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Ack> {
    match &mut *self {
      SharedAck::Ready(ack) => Poll::Ready(*ack),
      SharedAck::Pending(shared) => shared.poll_unpin(cx),
    }
  }
}

/// One-shot completable acknowledgement. Dropping the promise without
/// completing it resolves the paired future to `Done`, so an abandoned
/// consumer always stops its producer.
pub struct AckPromise {
  tx: oneshot::Sender<Ack>,
}

impl AckPromise {
  /// A promise plus the pending ack it completes.
  pub fn pair() -> (AckPromise, AckFuture) {
    let (tx, rx) = oneshot::channel();
    let future = rx.map(|result| result.unwrap_or(Ack::Done));
    (AckPromise { tx }, AckFuture::pending(future))
  }

  pub fn complete(self, ack: Ack) {
    let _ = self.tx.send(ack);
  }
}

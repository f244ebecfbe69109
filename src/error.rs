use std::{any::Any, error::Error as StdError, sync::Arc};

/// The error channel of a stream.
///
/// A stream terminates with at most one `on_error`, and a subject fans a
/// single failure out to every subscriber, so errors are cheaply cloneable
/// shared values.
#[derive(Clone, Debug, thiserror::Error)]
pub enum StreamError {
  /// A failure described only by a message.
  #[error("{0}")]
  Message(Arc<str>),
  /// A failure wrapping an underlying error value.
  #[error("{0}")]
  Source(Arc<dyn StdError + Send + Sync>),
  /// A panic captured from user code.
  #[error("user code panicked: {0}")]
  Panic(Arc<str>),
}

impl StreamError {
  pub fn msg(message: impl Into<String>) -> Self {
    StreamError::Message(Arc::from(message.into()))
  }

  pub fn source(error: impl StdError + Send + Sync + 'static) -> Self {
    StreamError::Source(Arc::new(error))
  }

  /// Convert a payload caught by `catch_unwind` into a stream error.
  pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
    let message = payload
      .downcast_ref::<&str>()
      .map(|s| (*s).to_owned())
      .or_else(|| payload.downcast_ref::<String>().cloned())
      .unwrap_or_else(|| "opaque panic payload".to_owned());
    StreamError::Panic(Arc::from(message))
  }
}

use crate::error::StreamError;

/// Tagged envelope reifying stream events as values; what `materialize`
/// emits.
#[derive(Clone, Debug)]
pub enum Notification<T> {
  OnNext(T),
  OnComplete,
  OnError(StreamError),
}

impl<T> Notification<T> {
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Notification::OnNext(_))
  }
}

use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

/// Emit every element of an iterable, one acknowledgement at a time.
///
/// The iterator is created when the subscription starts, so a cloneable
/// source can feed any number of independent subscriptions.
pub fn from_iter<I>(iter: I) -> FromIter<I>
where
  I: IntoIterator + Send + 'static,
  I::Item: Send + 'static,
  I::IntoIter: Send,
{
  FromIter(iter)
}

/// Emit an in-memory sequence in order.
pub fn from_seq<T: Send + 'static>(items: Vec<T>) -> FromIter<Vec<T>> {
  FromIter(items)
}

/// Emit the integers `start..end`.
pub fn range(start: i64, end: i64) -> FromIter<std::ops::Range<i64>> {
  FromIter(start..end)
}

#[derive(Clone)]
pub struct FromIter<I>(I);

impl<I> Observable for FromIter<I>
where
  I: IntoIterator + Send + 'static,
  I::Item: Send + 'static,
  I::IntoIter: Send,
{
  type Item = I::Item;

  fn unsafe_subscribe<O>(self, subscriber: Subscriber<O>)
  where
    O: Observer<Self::Item>,
  {
    let Subscriber { mut observer, scheduler } = subscriber;
    let iter = self.0.into_iter();
    scheduler.execute(Box::pin(async move {
      for value in iter {
        if observer.on_next(value).await.is_done() {
          return;
        }
      }
      observer.on_complete();
    }));
  }
}

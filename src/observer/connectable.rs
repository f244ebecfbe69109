use std::{collections::VecDeque, mem, sync::Arc};

use crossbeam_utils::atomic::AtomicCell;
use parking_lot::Mutex;

use crate::{
  ack::{Ack, AckFuture, AckPromise, SharedAck},
  error::StreamError,
  observer::Observer,
  scheduler::SchedulerRef,
};

/// An observer that buffers events until `connect()` is called.
///
/// Between creation and `connect()`, cached history is loaded with
/// `push_first` and an optional terminal with `schedule_complete` /
/// `schedule_error`; live events arriving early are chained behind the
/// drain. `connect()` replays the buffer onto the wrapped observer in
/// order, respecting back-pressure, after which the wrapper is transparent.
///
/// Subjects register every new subscriber behind one of these, which is
/// what makes delivery of cached history atomic with respect to live
/// emissions.
pub struct ConnectableObserver<T, O> {
  inner: Arc<ConnectableInner<T, O>>,
}

enum Terminal {
  Complete,
  Error(StreamError),
}

struct BufferState<T> {
  queue: VecDeque<T>,
  terminal: Option<Terminal>,
  connected: bool,
  // Resolves once everything enqueued ahead of a live event is delivered.
  gate: SharedAck,
  // Bumped on every gate replacement; a finished chain may promote the
  // gate back to a resolved value only if it is still the current one.
  generation: u64,
  release: Option<AckPromise>,
}

struct ConnectableInner<T, O> {
  observer: Mutex<O>,
  state: Mutex<BufferState<T>>,
  stopped: AtomicCell<bool>,
  scheduler: SchedulerRef,
}

impl<T, O> ConnectableObserver<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  pub fn new(observer: O, scheduler: SchedulerRef) -> Self {
    let (release, gate) = AckPromise::pair();
    ConnectableObserver {
      inner: Arc::new(ConnectableInner {
        observer: Mutex::new(observer),
        state: Mutex::new(BufferState {
          queue: VecDeque::new(),
          terminal: None,
          connected: false,
          gate: gate.shared(),
          generation: 0,
          release: Some(release),
        }),
        stopped: AtomicCell::new(false),
        scheduler,
      }),
    }
  }

  /// Append to the pre-connect buffer. Only meaningful before `connect()`.
  pub fn push_first(&self, value: T) {
    self.inner.state.lock().queue.push_back(value);
  }

  /// Schedule a terminal event behind the buffered items.
  pub fn schedule_complete(&self) {
    let mut state = self.inner.state.lock();
    state.terminal.get_or_insert(Terminal::Complete);
  }

  pub fn schedule_error(&self, error: StreamError) {
    let mut state = self.inner.state.lock();
    state.terminal.get_or_insert(Terminal::Error(error));
  }

  /// Drop anything buffered so far. Used when a registration retry starts
  /// over from a fresh state snapshot.
  pub(crate) fn reset_buffer(&self) {
    let mut state = self.inner.state.lock();
    state.queue.clear();
    state.terminal = None;
  }

  pub(crate) fn same(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  /// Replay the buffer, then become transparent. Idempotent.
  pub fn connect(&self) {
    let (queue, terminal, release) = {
      let mut state = self.inner.state.lock();
      if state.connected {
        return;
      }
      state.connected = true;
      (mem::take(&mut state.queue), state.terminal.take(), state.release.take())
    };
    if queue.is_empty() && terminal.is_none() {
      if let Some(release) = release {
        release.complete(Ack::Continue);
      }
      return;
    }
    let inner = Arc::clone(&self.inner);
    self.inner.scheduler.execute(Box::pin(async move {
      let mut result = Ack::Continue;
      for value in queue {
        if inner.stopped.load() {
          result = Ack::Done;
          break;
        }
        let ack = inner.observer.lock().on_next(value);
        if ack.await.is_done() {
          inner.stopped.store(true);
          result = Ack::Done;
          break;
        }
      }
      if result == Ack::Continue {
        if let Some(terminal) = terminal {
          inner.stopped.store(true);
          match terminal {
            Terminal::Complete => inner.observer.lock().on_complete(),
            Terminal::Error(error) => inner.observer.lock().on_error(error),
          }
          result = Ack::Done;
        }
      }
      if let Some(release) = release {
        release.complete(result);
      }
    }));
  }

  fn live_terminal(&self, terminal: Terminal) {
    let prev = {
      let mut state = self.inner.state.lock();
      if !state.connected {
        state.terminal.get_or_insert(terminal);
        return;
      }
      state.generation += 1;
      mem::replace(&mut state.gate, SharedAck::DONE)
    };
    let inner = Arc::clone(&self.inner);
    self.inner.scheduler.execute(Box::pin(async move {
      if prev.await.is_done() || inner.stopped.swap(true) {
        return;
      }
      match terminal {
        Terminal::Complete => inner.observer.lock().on_complete(),
        Terminal::Error(error) => inner.observer.lock().on_error(error),
      }
    }));
  }
}

impl<T, O> Clone for ConnectableObserver<T, O> {
  fn clone(&self) -> Self {
    ConnectableObserver { inner: Arc::clone(&self.inner) }
  }
}

impl<T, O> Observer<T> for ConnectableObserver<T, O>
where
  T: Send + 'static,
  O: Observer<T>,
{
  fn on_next(&mut self, value: T) -> AckFuture {
    if self.inner.stopped.load() {
      return AckFuture::DONE;
    }
    let mut state = self.inner.state.lock();
    if state.connected {
      match state.gate.as_ready() {
        Some(Ack::Continue) => {
          let ack = self.inner.observer.lock().on_next(value);
          let shared = ack.shared();
          state.gate = shared.clone();
          state.generation += 1;
          drop(state);
          return shared.into_ack_future();
        }
        Some(Ack::Done) => {
          drop(state);
          self.inner.stopped.store(true);
          return AckFuture::DONE;
        }
        None => {}
      }
    }
    // Not yet drained: chain behind whatever is still in flight.
    let prev = state.gate.clone();
    let (release, gate) = AckPromise::pair();
    state.gate = gate.shared();
    state.generation += 1;
    let my_generation = state.generation;
    drop(state);
    let inner = Arc::clone(&self.inner);
    AckFuture::pending(async move {
      let promote = |ack: Ack| {
        let mut state = inner.state.lock();
        if state.generation == my_generation {
          state.gate = SharedAck::Ready(ack);
        }
      };
      if prev.await.is_done() || inner.stopped.load() {
        inner.stopped.store(true);
        release.complete(Ack::Done);
        promote(Ack::Done);
        return Ack::Done;
      }
      let ack = inner.observer.lock().on_next(value);
      let ack = ack.await;
      if ack.is_done() {
        inner.stopped.store(true);
      }
      release.complete(ack);
      promote(ack);
      ack
    })
  }

  fn on_complete(&mut self) {
    self.live_terminal(Terminal::Complete);
  }

  fn on_error(&mut self, error: StreamError) {
    self.live_terminal(Terminal::Error(error));
  }
}

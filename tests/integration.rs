//! End-to-end pipeline tests: operator chains, subjects, threading.

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use futures::channel::oneshot;
use futures::executor::{block_on, ThreadPool};
use parking_lot::Mutex;
use rxflow::prelude::*;

fn scheduler() -> SchedulerRef {
  Arc::new(ThreadPool::new().expect("build thread pool"))
}

fn collect<S: Observable>(source: S) -> Vec<S::Item> {
  block_on(
    source
      .fold(Vec::new(), |mut acc, v| {
        acc.push(v);
        acc
      })
      .as_future(scheduler()),
  )
  .unwrap()
  .unwrap_or_default()
}

#[test]
fn map_then_fold_collects_the_whole_range() {
  let collected = collect(observable::range(0, 100).map(|v| v + 1));
  assert_eq!(collected, (1..=100).collect::<Vec<_>>());
}

#[test]
fn take_while_bounds_a_huge_range() {
  let collected =
    collect(observable::range(0, 100_000).take_while(|v| *v < 100).map(|v| v + 1));
  assert_eq!(collected, (1..=100).collect::<Vec<_>>());
}

#[test]
fn skip_while_drops_the_prefix() {
  let collected = collect(observable::range(0, 200).skip_while(|v| *v < 100));
  assert_eq!(collected, (100..200).collect::<Vec<_>>());
}

#[test]
fn zip_of_filtered_and_mapped_ranges() {
  let pairs = collect(observable::zip(
    observable::range(0, 10).filter(|v| v % 2 == 0),
    observable::range(0, 10).map(|v| v * 2),
  ));
  assert_eq!(pairs, vec![(0, 0), (2, 2), (4, 4), (6, 6), (8, 8)]);
}

#[test]
fn continuous_take_folds_to_the_count() {
  let sum = block_on(
    observable::continuous(1i64)
      .take(5000)
      .fold(0i64, |acc, v| acc + v)
      .as_future(scheduler()),
  );
  assert_eq!(sum.unwrap(), Some(5000));
}

#[test]
fn replay_subject_hands_history_then_live_events() {
  let scheduler = scheduler();
  let mut subject = ReplaySubject::new();
  let _ = block_on(subject.on_next(1));
  let _ = block_on(subject.on_next(2));
  let _ = block_on(subject.on_next(3));

  let collected = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&collected);
  let (tx, rx) = oneshot::channel();
  let mut tx = Some(tx);
  subject.clone().subscribe_all(
    move |v| sink.lock().push(v),
    |_| {},
    move || {
      if let Some(tx) = tx.take() {
        let _ = tx.send(());
      }
    },
    scheduler,
  );

  let _ = block_on(subject.on_next(4));
  subject.on_complete();
  block_on(rx).unwrap();
  assert_eq!(*collected.lock(), vec![1, 2, 3, 4]);
}

#[test]
fn a_panicking_user_function_stops_the_producer() {
  let scheduler = scheduler();
  let produced = Arc::new(AtomicUsize::new(0));
  let counted = Arc::clone(&produced);
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&seen);
  let errors = Arc::new(AtomicUsize::new(0));
  let error_count = Arc::clone(&errors);
  let (tx, rx) = oneshot::channel();
  let mut tx = Some(tx);

  observable::range(0, 1_000)
    .do_on_next(move |_| {
      counted.fetch_add(1, Ordering::SeqCst);
    })
    .map(|v| if v == 4 { panic!("fifth element is cursed") } else { v })
    .subscribe_all(
      move |v| sink.lock().push(v),
      move |e| {
        assert!(e.to_string().contains("fifth element is cursed"));
        error_count.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = tx.take() {
          let _ = tx.send(());
        }
      },
      || panic!("stream must not complete"),
      scheduler,
    );

  block_on(rx).unwrap();
  assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
  assert_eq!(errors.load(Ordering::SeqCst), 1);
  // The upstream saw the failing element and nothing after it.
  assert_eq!(produced.load(Ordering::SeqCst), 5);
}

#[test]
fn filter_equals_flat_map_into_option() {
  let filtered = collect(observable::range(0, 20).filter(|v| v % 3 == 0));
  let flat = collect(
    observable::range(0, 20)
      .flat_map(|v| observable::from_iter(if v % 3 == 0 { Some(v) } else { None })),
  );
  assert_eq!(filtered, flat);
}

#[test]
fn map_equals_flat_map_into_unit() {
  let mapped = collect(observable::range(0, 20).map(|v| v * 7));
  let flat = collect(observable::range(0, 20).flat_map(|v| observable::unit(v * 7)));
  assert_eq!(mapped, flat);
}

#[test]
fn map_flatten_equals_flat_map() {
  let mapped = collect(
    observable::range(0, 10)
      .map(|v| observable::range(v, v + 3))
      .flatten(),
  );
  let flat = collect(observable::range(0, 10).flat_map(|v| observable::range(v, v + 3)));
  assert_eq!(mapped, flat);
}

#[test]
fn scan_prefixes_agree_with_fold() {
  let scanned = collect(observable::range(1, 8).scan(0, |acc, v| acc + v));
  for (k, value) in scanned.iter().enumerate() {
    let folded = block_on(
      observable::range(1, 2 + k as i64)
        .fold(0, |acc, v| acc + v)
        .as_future(scheduler()),
    )
    .unwrap()
    .unwrap();
    assert_eq!(*value, folded);
  }
}

#[test]
fn concat_of_sources_preserves_order() {
  let collected = collect(observable::concat(vec![
    observable::range(0, 3),
    observable::range(10, 13),
    observable::range(20, 23),
  ]));
  assert_eq!(collected, vec![0, 1, 2, 10, 11, 12, 20, 21, 22]);
}

#[test]
fn merge_of_sources_delivers_everything() {
  let mut collected = collect(observable::merge(vec![
    observable::range(0, 50),
    observable::range(100, 150),
  ]));
  collected.sort();
  let expected: Vec<i64> = (0..50).chain(100..150).collect();
  assert_eq!(collected, expected);
}

#[test]
fn buffered_decouples_a_subject_from_slow_subscribers() {
  let scheduler = scheduler();
  let mut subject = PublishSubject::new();

  let collected = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&collected);
  let (tx, rx) = oneshot::channel();
  let mut tx = Some(tx);
  subject.clone().buffered().subscribe_all(
    move |v| sink.lock().push(v),
    |_| {},
    move || {
      if let Some(tx) = tx.take() {
        let _ = tx.send(());
      }
    },
    scheduler,
  );

  // Every push is acknowledged synchronously by the buffer.
  for i in 0..100 {
    assert!(block_on(subject.on_next(i)) == Ack::Continue);
  }
  subject.on_complete();
  block_on(rx).unwrap();
  assert_eq!(*collected.lock(), (0..100).collect::<Vec<_>>());
}

#[test]
fn behavior_subject_through_operators() {
  let scheduler = scheduler();
  let mut subject = BehaviorSubject::new(0);

  let collected = Arc::new(Mutex::new(Vec::new()));
  let sink = Arc::clone(&collected);
  let (tx, rx) = oneshot::channel();
  let mut tx = Some(tx);
  subject.clone().map(|v| v * 10).filter(|v| *v > 0).subscribe_all(
    move |v| sink.lock().push(v),
    |_| {},
    move || {
      if let Some(tx) = tx.take() {
        let _ = tx.send(());
      }
    },
    scheduler,
  );

  let _ = block_on(subject.on_next(1));
  let _ = block_on(subject.on_next(2));
  subject.on_complete();
  block_on(rx).unwrap();
  assert_eq!(*collected.lock(), vec![10, 20]);
}

#[test]
fn observe_on_hops_but_preserves_order() {
  let collected = collect(observable::range(0, 500).observe_on(scheduler()));
  assert_eq!(collected, (0..500).collect::<Vec<_>>());
}

#[test]
fn materialize_reifies_a_failure() {
  let events = collect(
    observable::range(0i64, 3)
      .map(|v| if v == 2 { panic!("third element failed") } else { v })
      .materialize(),
  );
  assert_eq!(events.len(), 3);
  assert!(matches!(events[0], Notification::OnNext(0)));
  assert!(matches!(events[1], Notification::OnNext(1)));
  assert!(
    matches!(&events[2], Notification::OnError(e) if e.to_string().contains("third element failed"))
  );
}

#[test]
fn take_terminates_an_infinite_producer() {
  let collected = collect(observable::continuous(7).take(4));
  assert_eq!(collected, vec![7, 7, 7, 7]);
}

#[test]
fn publish_multicasts_one_production() {
  let scheduler = scheduler();
  let counted = Arc::new(AtomicUsize::new(0));
  let tapped = Arc::clone(&counted);
  let connectable = observable::range(0, 10)
    .do_on_next(move |_| {
      tapped.fetch_add(1, Ordering::SeqCst);
    })
    .publish();

  let sums = Arc::new(Mutex::new(Vec::new()));
  let mut waits = Vec::new();
  for _ in 0..2 {
    let sums = Arc::clone(&sums);
    let (tx, rx) = oneshot::channel();
    waits.push(rx);
    let total = Arc::new(AtomicUsize::new(0));
    let mut tx = Some(tx);
    connectable.fork().subscribe_all(
      move |v: i64| {
        total.fetch_add(v as usize, Ordering::SeqCst);
        if v == 9 {
          sums.lock().push(total.load(Ordering::SeqCst));
        }
      },
      |_| {},
      move || {
        if let Some(tx) = tx.take() {
          let _ = tx.send(());
        }
      },
      scheduler.clone(),
    );
  }
  connectable.connect(scheduler);
  for rx in waits {
    block_on(rx).unwrap();
  }
  // One shared pass over the source, both subscribers saw all of it.
  assert_eq!(counted.load(Ordering::SeqCst), 10);
  assert_eq!(*sums.lock(), vec![45, 45]);
}

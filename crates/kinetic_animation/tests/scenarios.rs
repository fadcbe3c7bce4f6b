//! End-to-end scenarios: a real worker thread, a hand-driven clock and a
//! dispatcher pumped by the test thread standing in for the UI thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kinetic_animation::{AnimationError, Animator, AnimatorConfig};
use kinetic_core::{AnimValue, Dispatcher, ManualClock, PropertyTable, StepError};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Target recording every value written to `x`
#[derive(Default)]
struct Knob {
    applied: Mutex<Vec<i32>>,
}

impl Knob {
    fn values(&self) -> Vec<i32> {
        self.applied.lock().clone()
    }

    fn last(&self) -> Option<i32> {
        self.applied.lock().last().copied()
    }
}

struct Fixture {
    clock: Arc<ManualClock>,
    ui: Arc<Dispatcher>,
    errors: Arc<Mutex<Vec<StepError>>>,
    animator: Animator,
}

impl Fixture {
    fn new(clock: ManualClock, quantum_ms: u64) -> Self {
        init_tracing();

        let table = PropertyTable::new();
        table.register("x", |knob: &Knob, v: i32| knob.applied.lock().push(v));
        table.register_fallible("fragile", |knob: &Knob, v: i32| {
            if v > 10 {
                return Err(kinetic_core::PropertyError::Rejected(format!("{v} is too far")));
            }
            knob.applied.lock().push(v);
            Ok(())
        });

        let clock = Arc::new(clock);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let ui = Arc::new(
            Dispatcher::new(clock.clone()).with_error_handler(move |e| sink.lock().push(e.clone())),
        );
        let config = AnimatorConfig::default().with_quantum(Duration::from_millis(quantum_ms));
        let animator = Animator::new(config, ui.clone(), Arc::new(table)).unwrap();

        Self {
            clock,
            ui,
            errors,
            animator,
        }
    }

    /// Play the UI thread until `done` holds, failing after five seconds
    fn pump_until(&self, what: &str, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            self.ui.wait_and_run(Duration::from_millis(5));
            if done() {
                return;
            }
        }
        panic!("timed out waiting for {what}");
    }

    /// Play the UI thread for a while without expecting anything
    fn pump_for(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            self.ui.wait_and_run(Duration::from_millis(2));
        }
    }
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    let make = move || -> Box<dyn FnOnce() + Send> {
        let handle = Arc::clone(&handle);
        Box::new(move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    };
    (count, make)
}

#[test]
fn monotone_progress_ends_exactly_on_target() {
    // Every clock reading moves time forward by 10ms
    let f = Fixture::new(ManualClock::with_auto_advance(0, 10), 5);
    let knob = Arc::new(Knob::default());
    let (done, callback) = counter();

    f.animator
        .start(&knob, "x", 0, 100, Duration::from_millis(100), 0, Some(callback()))
        .unwrap();
    f.pump_until("completion", || done.load(Ordering::SeqCst) == 1);

    let values = knob.values();
    assert!(values.len() > 2, "expected intermediate values, got {values:?}");
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "not monotone: {values:?}");
    assert!(values.iter().all(|v| (0..=100).contains(v)));
    assert_eq!(knob.last(), Some(100));
    assert!(!f.animator.is_animating(&knob, "x"));
}

#[test]
fn colliding_requests_merge_into_one_instance() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());

    f.animator
        .start(&knob, "x", 0, 100, Duration::from_millis(100), 0, None)
        .unwrap();
    f.animator
        .start(&knob, "x", 100, 200, Duration::from_millis(50), 0, None)
        .unwrap();

    f.pump_until("merge", || {
        f.animator
            .animation_info(&knob, "x")
            .is_some_and(|info| info.total_ticks == 150)
    });

    let info = f.animator.animation_info(&knob, "x").unwrap();
    assert_eq!(f.animator.active_count(), 1);
    assert_eq!(info.end_value, AnimValue::I32(200));
    assert_eq!(info.end_time, 150);

    f.clock.set(150);
    f.pump_until("completion", || !f.animator.is_animating(&knob, "x"));
    assert_eq!(knob.last(), Some(200));
}

#[test]
fn merged_callbacks_fire_in_attachment_order() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());
    let order = Arc::new(Mutex::new(Vec::new()));

    for (i, to) in [(1, 10), (2, 20), (3, 30)] {
        let order = Arc::clone(&order);
        f.animator
            .animate(&knob, "x", 0, to)
            .duration_ms(100)
            .on_complete(move || order.lock().push(i))
            .start()
            .unwrap();
    }

    f.pump_until("three merges", || {
        f.animator
            .animation_info(&knob, "x")
            .is_some_and(|info| info.callbacks == 3)
    });
    assert!(order.lock().is_empty());
    assert_eq!(f.animator.active_count(), 1);

    f.clock.set(300);
    f.pump_until("callbacks", || order.lock().len() == 3);
    assert_eq!(*order.lock(), vec![1, 2, 3]);
    assert_eq!(knob.last(), Some(30));
}

#[test]
fn pulsation_plays_back_and_deregisters_once() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());
    let (done, callback) = counter();

    f.animator
        .start(&knob, "x", 0, 1, Duration::from_millis(10), 1, Some(callback()))
        .unwrap();
    f.pump_until("start", || f.animator.is_animating(&knob, "x"));

    f.clock.set(10);
    f.pump_until("end value", || knob.last() == Some(1));
    let info = f.animator.animation_info(&knob, "x").unwrap();
    assert_eq!(info.pulsations, 0);
    assert_eq!(info.end_value, AnimValue::I32(0));

    f.clock.set(20);
    f.pump_until("completion", || done.load(Ordering::SeqCst) == 1);
    assert_eq!(knob.last(), Some(0));

    let mut path = knob.values();
    path.dedup();
    assert_eq!(path, vec![0, 1, 0]);

    // Nothing left to finish a second time
    f.clock.set(1_000);
    f.pump_for(Duration::from_millis(30));
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(f.animator.active_count(), 0);
}

#[test]
fn two_pulsations_end_on_the_target_value() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());
    let (done, callback) = counter();

    f.animator
        .start(&knob, "x", 0, 1, Duration::from_millis(10), 2, Some(callback()))
        .unwrap();
    f.pump_until("start", || f.animator.is_animating(&knob, "x"));

    f.clock.set(10);
    f.pump_until("first end value", || knob.last() == Some(1));
    f.clock.set(20);
    f.pump_until("back at start", || knob.last() == Some(0));
    f.clock.set(30);
    f.pump_until("completion", || done.load(Ordering::SeqCst) == 1);

    let mut path = knob.values();
    path.dedup();
    assert_eq!(path, vec![0, 1, 0, 1]);

    f.clock.set(1_000);
    f.pump_for(Duration::from_millis(30));
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(f.animator.active_count(), 0);
}

#[test]
fn unknown_property_fails_before_scheduling() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());

    let err = f
        .animator
        .start(&knob, "y", 0, 1, Duration::from_millis(10), 0, None)
        .unwrap_err();
    assert!(matches!(err, AnimationError::PropertyNotFound { ref property, .. } if property == "y"));

    f.pump_for(Duration::from_millis(20));
    assert_eq!(f.animator.active_count(), 0);
    assert!(knob.values().is_empty());
}

#[test]
fn rejected_write_aborts_animation() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());
    let (done, callback) = counter();

    f.animator
        .start(&knob, "fragile", 0, 20, Duration::from_millis(100), 0, Some(callback()))
        .unwrap();
    f.pump_until("start", || f.animator.is_animating(&knob, "fragile"));

    f.clock.set(80);
    f.pump_until("failure", || !f.errors.lock().is_empty());

    assert!(!f.animator.is_animating(&knob, "fragile"));
    assert!(matches!(
        &f.errors.lock()[0],
        StepError::Property { property, .. } if property == "fragile"
    ));

    f.clock.set(200);
    f.pump_for(Duration::from_millis(30));
    assert_eq!(done.load(Ordering::SeqCst), 0);
    assert!(knob.values().iter().all(|v| *v <= 10));
}

#[test]
fn callback_can_restart_same_property() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());
    let (done, callback) = counter();

    let animator = f.animator.clone();
    let again = Arc::clone(&knob);
    f.animator
        .animate(&knob, "x", 0, 10)
        .duration_ms(10)
        .on_complete(move || {
            animator
                .start(&again, "x", 10, 0, Duration::from_millis(10), 0, Some(callback()))
                .unwrap();
        })
        .start()
        .unwrap();

    f.pump_until("start", || f.animator.is_animating(&knob, "x"));
    f.clock.set(10);
    f.pump_until("first run", || knob.last() == Some(10));

    // The follow-up is a fresh instance, not merged into the finished one
    f.pump_until("second run", || {
        f.animator
            .animation_info(&knob, "x")
            .is_some_and(|info| info.total_ticks == 10 && info.end_value == AnimValue::I32(0))
    });
    f.clock.set(20);
    f.pump_until("completion", || done.load(Ordering::SeqCst) == 1);
    assert_eq!(knob.last(), Some(0));
    assert_eq!(f.animator.active_count(), 0);
}

#[test]
fn cancel_stops_updates() {
    let f = Fixture::new(ManualClock::new(0), 1);
    let knob = Arc::new(Knob::default());

    f.animator
        .start(&knob, "x", 0, 100, Duration::from_millis(100), 0, None)
        .unwrap();
    f.pump_until("start", || f.animator.is_animating(&knob, "x"));
    f.clock.set(50);
    f.pump_until("halfway", || knob.last() == Some(50));

    f.animator.cancel(&knob, "x").unwrap();
    f.pump_until("cancel", || f.animator.active_count() == 0);

    f.clock.set(100);
    f.pump_for(Duration::from_millis(20));
    assert_eq!(knob.last(), Some(50));
}

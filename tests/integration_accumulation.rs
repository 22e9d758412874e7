use std::time::{Duration, Instant};

use stillness::engine::Practice;
use stillness::events::Intent;
use stillness::render::RecordingBridge;
use stillness::session::SessionRegistry;
use stillness::store::{
    today_key, KvStore, MemoryKvStore, StoreError, KEY_DATE, KEY_TOTAL_SECONDS,
};

fn setup() -> (Practice, RecordingBridge, MemoryKvStore) {
    let mut engine = Practice::new(SessionRegistry::builtin(), false);
    let mut bridge = RecordingBridge::new();
    let mut store = MemoryKvStore::new();
    engine.startup(&mut bridge, &mut store).unwrap();
    (engine, bridge, store)
}

fn stored_total(store: &MemoryKvStore) -> u64 {
    store
        .get(KEY_TOTAL_SECONDS)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

// Property: collapse, then background loss, then process exit commit the run
// exactly once, not three times.
#[test]
fn commit_happens_exactly_once_across_all_exit_paths() {
    let (mut engine, mut bridge, mut store) = setup();
    let t0 = Instant::now();
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);

    let t1 = t0 + Duration::from_secs(30);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t1); // collapse
    assert_eq!(stored_total(&store), 30);

    engine.handle_intent(Intent::ForegroundExit, &mut bridge, &mut store, t1);
    engine.stop(&mut store, t1);
    assert_eq!(stored_total(&store), 30);
    assert_eq!(engine.accum_secs_today(), 30);
}

#[test]
fn background_loss_commits_then_stop_is_noop() {
    let (mut engine, mut bridge, mut store) = setup();
    let t0 = Instant::now();
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);

    let t1 = t0 + Duration::from_secs(25);
    engine.handle_intent(Intent::ForegroundExit, &mut bridge, &mut store, t1);
    assert_eq!(stored_total(&store), 25);

    // Process exit while still backgrounded: nothing more to add.
    engine.stop(&mut store, t1 + Duration::from_secs(99));
    assert_eq!(stored_total(&store), 25);
}

#[test]
fn resumed_run_does_not_double_count() {
    let (mut engine, mut bridge, mut store) = setup();
    let t0 = Instant::now();
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);

    // Brief background blip commits the 20 seconds so far.
    let t1 = t0 + Duration::from_secs(20);
    engine.handle_intent(Intent::ForegroundExit, &mut bridge, &mut store, t1);
    engine.handle_intent(Intent::ForegroundEnter, &mut bridge, &mut store, t1 + Duration::from_secs(5));
    assert_eq!(stored_total(&store), 20);

    // Collapsing later finds the guard disarmed; the total stays committed
    // once per run.
    engine.handle_intent(
        Intent::Tap,
        &mut bridge,
        &mut store,
        t1 + Duration::from_secs(65),
    );
    assert_eq!(stored_total(&store), 20);
}

#[test]
fn zero_elapsed_run_commits_nothing() {
    let (mut engine, mut bridge, mut store) = setup();
    let t0 = Instant::now();
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);
    // Collapse within the same second.
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);
    assert_eq!(stored_total(&store), 0);

    // A later run still accrues normally.
    let t1 = t0 + Duration::from_secs(5);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t1);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t1 + Duration::from_secs(10));
    assert_eq!(stored_total(&store), 10);
}

#[test]
fn consecutive_runs_accumulate() {
    let (mut engine, mut bridge, mut store) = setup();
    let t0 = Instant::now();
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0 + Duration::from_secs(10));
    let t1 = t0 + Duration::from_secs(60);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t1);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t1 + Duration::from_secs(15));
    assert_eq!(stored_total(&store), 25);
    assert_eq!(engine.accum_secs_today(), 25);
}

#[test]
fn stale_date_resets_on_startup() {
    let mut store = MemoryKvStore::new();
    store.set(KEY_DATE, "2001-01-01").unwrap();
    store.set(KEY_TOTAL_SECONDS, "999").unwrap();

    let mut engine = Practice::new(SessionRegistry::builtin(), false);
    let mut bridge = RecordingBridge::new();
    engine.startup(&mut bridge, &mut store).unwrap();

    assert_eq!(engine.accum_secs_today(), 0);
    assert_eq!(store.get(KEY_DATE), Some(today_key()));

    // A run after rollover starts the counter from zero, not 999.
    let t0 = Instant::now();
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0 + Duration::from_secs(12));
    assert_eq!(stored_total(&store), 12);
}

/// Store whose writes always fail, for exercising the degrade paths.
#[derive(Default)]
struct BrokenStore;

impl KvStore for BrokenStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk gone")))
    }
}

#[test]
fn broken_store_never_interrupts_the_session() {
    let mut engine = Practice::new(SessionRegistry::builtin(), false);
    let mut bridge = RecordingBridge::new();
    let mut store = BrokenStore;
    engine.startup(&mut bridge, &mut store).unwrap();
    assert_eq!(engine.accum_secs_today(), 0);

    let t0 = Instant::now();
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0);
    assert!(engine.is_running());
    engine.handle_intent(Intent::SwipeDown, &mut bridge, &mut store, t0);
    engine.handle_intent(Intent::Tap, &mut bridge, &mut store, t0 + Duration::from_secs(30));
    // Commit was attempted and lost; everything else carries on.
    assert!(!engine.is_expanded());
}

//! End-to-end scenarios driven through the public API in virtual time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use jobvisor::{
    Config, DeferredPolicy, Event, EventKind, Job, JobError, JobRef, JobState, ScheduleError,
    Scheduler, Subscribe,
};

/// Counts executions and tracks the highest number running at once.
#[derive(Default)]
struct Tally {
    runs: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    started: Mutex<Vec<Instant>>,
}

impl Tally {
    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn started(&self) -> Vec<Instant> {
        self.started.lock().unwrap().clone()
    }
}

fn counted(name: &'static str, tally: &Arc<Tally>, work: Duration) -> Job {
    let tally = Arc::clone(tally);
    Job::from_fn(name, move |_ctx: CancellationToken| {
        let tally = Arc::clone(&tally);
        async move {
            tally.started.lock().unwrap().push(Instant::now());
            let now = tally.active.fetch_add(1, Ordering::SeqCst) + 1;
            tally.peak.fetch_max(now, Ordering::SeqCst);
            sleep(work).await;
            tally.active.fetch_sub(1, Ordering::SeqCst);
            tally.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn deferrals(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|ev| ev.kind == EventKind::JobChanged)
        .filter(|ev| matches!(ev.job.as_deref(), Some(j) if j.state == JobState::ExecutionDeferred))
        .count()
}

#[tokio::test(start_paused = true)]
async fn debounce_collapses_requests_into_one_delayed_run() {
    let sched = Scheduler::builder(Config::default()).build();
    let tally = Arc::new(Tally::default());
    let t0 = Instant::now();

    sched
        .debounced(Duration::from_secs(5), counted("deploy", &tally, Duration::ZERO).into_ref())
        .await;
    sleep(Duration::from_secs(3)).await;
    sched
        .debounced(Duration::from_secs(5), counted("deploy", &tally, Duration::ZERO).into_ref())
        .await;

    sleep(Duration::from_millis(4_900)).await;
    assert_eq!(tally.runs(), 0, "first request was superseded");

    sleep(Duration::from_secs(5)).await;
    assert_eq!(tally.runs(), 1);
    let started = tally.started();
    assert!(started[0] - t0 >= Duration::from_secs(8));
    assert!(started[0] - t0 < Duration::from_secs(9));
    assert!(sched.status().await.is_empty(), "fired entry is swept");
}

#[tokio::test(start_paused = true)]
async fn n_times_every_runs_exactly_n_times_then_leaves() {
    let sched = Scheduler::builder(Config::default()).build();
    let tally = Arc::new(Tally::default());
    let job = counted("tick", &tally, Duration::ZERO).into_ref();

    sched
        .n_times_every(5, Duration::from_secs(2), JobRef::clone(&job))
        .await
        .unwrap();

    sleep(Duration::from_secs(11)).await;
    assert_eq!(tally.runs(), 5);
    assert!(sched.status().await.is_empty());
    assert_eq!(job.state(), JobState::Finished);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(tally.runs(), 5, "no run after exhaustion");
}

#[tokio::test(start_paused = true)]
async fn instant_in_the_past_is_rejected() {
    let sched = Scheduler::builder(Config::default()).build();
    let past = sched.now() - TimeDelta::seconds(30);
    let job = Job::from_fn("late", |_ctx: CancellationToken| async { Ok(()) }).into_ref();

    let err = sched.at(past, JobRef::clone(&job)).await.unwrap_err();
    assert_eq!(err, ScheduleError::InPast { at: past });
    assert!(sched.status().await.is_empty());
    assert_eq!(job.state(), JobState::New);
}

#[tokio::test(start_paused = true)]
async fn at_fires_once_at_the_instant() {
    let sched = Scheduler::builder(Config::default()).build();
    let tally = Arc::new(Tally::default());
    let t0 = Instant::now();

    let when = sched.now() + TimeDelta::seconds(4);
    sched
        .at(when, counted("later", &tally, Duration::ZERO).into_ref())
        .await
        .unwrap();

    sleep(Duration::from_secs(10)).await;
    assert_eq!(tally.runs(), 1);
    let waited = tally.started()[0] - t0;
    assert!(waited >= Duration::from_secs(4) && waited < Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn limiter_bounds_concurrency_across_jobs() {
    let cfg = Config {
        pool_size: 2,
        ..Config::default()
    };
    let sched = Scheduler::builder(cfg).build();
    let mut rx = sched.subscribe();
    let tally = Arc::new(Tally::default());

    for name in ["a", "b", "c", "d", "e"] {
        sched
            .once_now(counted(name, &tally, Duration::from_secs(1)).into_ref())
            .await;
    }

    sleep(Duration::from_secs(5)).await;
    assert_eq!(tally.runs(), 5, "queued triggers run eventually");
    assert!(tally.peak() <= 2);
    assert!(deferrals(&drain(&mut rx)) >= 3);
    assert_eq!(sched.available_permits(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn skip_drops_triggers_while_saturated() {
    let cfg = Config {
        pool_size: 1,
        deferred: DeferredPolicy::Skip,
        ..Config::default()
    };
    let sched = Scheduler::builder(cfg).build();
    let tally = Arc::new(Tally::default());

    sched
        .once_now(counted("first", &tally, Duration::from_secs(2)).into_ref())
        .await;
    sleep(Duration::from_millis(10)).await;
    let dropped = counted("second", &tally, Duration::from_secs(2)).into_ref();
    sched.once_now(JobRef::clone(&dropped)).await;

    sleep(Duration::from_secs(5)).await;
    assert_eq!(tally.runs(), 1);
    assert_eq!(dropped.result(), None, "skipped trigger never ran");
    assert_eq!(dropped.state(), JobState::Finished);
}

#[tokio::test(start_paused = true)]
async fn a_job_never_overlaps_itself() {
    for policy in [DeferredPolicy::Skip, DeferredPolicy::Queue] {
        let sched = Scheduler::builder(Config::default()).build();
        let mut rx = sched.subscribe();
        let tally = Arc::new(Tally::default());
        let job = counted("slow", &tally, Duration::from_millis(2_500))
            .with_deferred(policy)
            .into_ref();

        sched.every(Duration::from_secs(1), job).await;
        sleep(Duration::from_secs(10)).await;
        sched.stop();

        assert_eq!(tally.peak(), 1, "{policy:?}");
        assert!(tally.runs() >= 2, "{policy:?}");
        assert!(deferrals(&drain(&mut rx)) >= 1, "{policy:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn self_concurrent_jobs_may_overlap() {
    let cfg = Config {
        self_concurrent: true,
        ..Config::default()
    };
    let sched = Scheduler::builder(cfg).build();
    let tally = Arc::new(Tally::default());

    sched
        .every(
            Duration::from_secs(1),
            counted("slow", &tally, Duration::from_millis(2_500)).into_ref(),
        )
        .await;
    sleep(Duration::from_secs(6)).await;

    assert!(tally.peak() >= 2);
}

#[tokio::test(start_paused = true)]
async fn finished_is_observed_exactly_once() {
    let sched = Scheduler::builder(Config::default()).build();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = sched.on_job_changed(move |job| {
        sink.lock().unwrap().push(job.state);
    });

    let job = Job::from_fn("once", |_ctx: CancellationToken| async { Ok(()) }).into_ref();
    sched.once_now(job).await;
    // past one maintenance cycle (refresh + sweep)
    sleep(Duration::from_secs(20)).await;

    let seen = seen.lock().unwrap().clone();
    let finished = seen.iter().filter(|s| **s == JobState::Finished).count();
    assert_eq!(finished, 1, "{seen:?}");
    assert_eq!(seen.first(), Some(&JobState::Initializing));
    assert!(seen.contains(&JobState::Running));
}

#[tokio::test(start_paused = true)]
async fn redebouncing_a_running_job_lets_the_execution_finish() {
    let sched = Scheduler::builder(Config::default()).build();
    let tally = Arc::new(Tally::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = sched.on_job_changed(move |job| {
        sink.lock().unwrap().push(job.state);
    });
    let job = counted("rebuild", &tally, Duration::from_secs(10)).into_ref();

    sched.debounced(Duration::from_secs(1), JobRef::clone(&job)).await;
    sleep(Duration::from_secs(2)).await;
    assert_eq!(job.state(), JobState::Running);

    // supersedes the entry that is executing right now
    sched.debounced(Duration::from_secs(30), JobRef::clone(&job)).await;
    sleep(Duration::from_secs(1)).await;
    assert_eq!(job.state(), JobState::Running, "in-flight run is not disturbed");
    assert_eq!(sched.status().await.len(), 1);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(tally.runs(), 1);
    assert_eq!(job.state(), JobState::Idle, "a later run is still pending");
    assert_eq!(sched.status().await.len(), 1);
    assert!(!seen.lock().unwrap().contains(&JobState::Finished));

    sleep(Duration::from_secs(35)).await;
    assert_eq!(tally.runs(), 2);
    assert_eq!(tally.peak(), 1);
    assert_eq!(job.state(), JobState::Finished);
    assert!(sched.status().await.is_empty());

    let seen = seen.lock().unwrap().clone();
    let finished = seen.iter().filter(|s| **s == JobState::Finished).count();
    assert_eq!(finished, 1, "{seen:?}");
    assert_eq!(seen.last(), Some(&JobState::Finished));
}

#[tokio::test(start_paused = true)]
async fn panics_are_contained_and_reported() {
    let sched = Scheduler::builder(Config::default()).build();
    let mut rx = sched.subscribe();

    let bad = Job::from_fn("bad", |_ctx: CancellationToken| async {
        if true {
            panic!("boom");
        }
        Ok(())
    })
    .into_ref();
    sched.once_now(JobRef::clone(&bad)).await;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(
        bad.result(),
        Some(Err(JobError::Panicked {
            info: "boom".to_string()
        }))
    );
    assert_eq!(bad.state(), JobState::Finished);
    let panicked: Vec<Event> = drain(&mut rx)
        .into_iter()
        .filter(|ev| ev.kind == EventKind::JobPanicked)
        .collect();
    assert_eq!(panicked.len(), 1);
    assert_eq!(panicked[0].reason.as_deref(), Some("boom"));

    let tally = Arc::new(Tally::default());
    sched
        .once_now(counted("after", &tally, Duration::ZERO).into_ref())
        .await;
    sleep(Duration::from_secs(1)).await;
    assert_eq!(tally.runs(), 1, "scheduler keeps working");
}

#[tokio::test(start_paused = true)]
async fn failures_are_recorded_and_recurring_jobs_continue() {
    let sched = Scheduler::builder(Config::default()).build();
    let job = Job::from_fn("flaky", |_ctx: CancellationToken| async {
        Err(JobError::fail("upstream down"))
    })
    .into_ref();

    sched.every(Duration::from_secs(1), JobRef::clone(&job)).await;
    sleep(Duration::from_millis(3_500)).await;

    assert_eq!(job.result(), Some(Err(JobError::fail("upstream down"))));
    assert_eq!(job.state(), JobState::Idle);
    assert_eq!(sched.status().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn removed_entries_stop_firing() {
    let sched = Scheduler::builder(Config::default()).build();
    let mut rx = sched.subscribe();
    let tally = Arc::new(Tally::default());
    let job = counted("poll", &tally, Duration::ZERO).into_ref();

    let id = sched.every(Duration::from_secs(1), JobRef::clone(&job)).await;
    sleep(Duration::from_millis(2_500)).await;
    let before = tally.runs();
    assert!(before >= 1);

    assert!(sched.remove(id).await);
    assert!(!sched.remove(id).await);
    sleep(Duration::from_secs(5)).await;

    assert_eq!(tally.runs(), before);
    assert_eq!(job.state(), JobState::Finished);
    let removed: Vec<Event> = drain(&mut rx)
        .into_iter()
        .filter(|ev| ev.kind == EventKind::EntryRemoved)
        .collect();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].entry, Some(id));
    assert_eq!(removed[0].reason.as_deref(), Some("removed"));
}

#[tokio::test(start_paused = true)]
async fn events_carry_increasing_sequence_numbers() {
    let sched = Scheduler::builder(Config::default()).build();
    let mut rx = sched.subscribe();
    let job = Job::from_fn("seq", |_ctx: CancellationToken| async { Ok(()) }).into_ref();

    sched.once_now(job).await;
    sleep(Duration::from_secs(1)).await;

    let seqs: Vec<u64> = drain(&mut rx).iter().map(|ev| ev.seq).collect();
    assert!(seqs.len() >= 4);
    assert!(seqs.windows(2).all(|w| w[0] < w[1]), "{seqs:?}");
}

struct Collect {
    kinds: Arc<Mutex<Vec<EventKind>>>,
}

#[async_trait]
impl Subscribe for Collect {
    async fn on_event(&self, event: &Event) {
        self.kinds.lock().unwrap().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "collect"
    }
}

#[tokio::test(start_paused = true)]
async fn builder_subscribers_see_the_event_stream() {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sched = Scheduler::builder(Config::default())
        .with_subscriber(Arc::new(Collect {
            kinds: Arc::clone(&kinds),
        }))
        .build();

    let job = Job::from_fn("watched", |_ctx: CancellationToken| async { Ok(()) }).into_ref();
    sched.once_now(job).await;
    sleep(Duration::from_secs(1)).await;

    let kinds = kinds.lock().unwrap().clone();
    assert_eq!(kinds.first(), Some(&EventKind::JobScheduled));
    assert!(kinds.contains(&EventKind::JobChanged));
    assert!(kinds.contains(&EventKind::EntryRemoved));
}

#[tokio::test(start_paused = true)]
async fn shutdown_reports_completion_within_grace() {
    let sched = Scheduler::builder(Config::default()).build();
    let mut rx = sched.subscribe();
    let tally = Arc::new(Tally::default());
    sched
        .once_now(counted("short", &tally, Duration::from_millis(500)).into_ref())
        .await;
    sleep(Duration::from_millis(100)).await;

    sched.shutdown().await.unwrap();
    assert_eq!(tally.runs(), 1, "in-flight execution completed");

    let kinds: Vec<EventKind> = drain(&mut rx).iter().map(|ev| ev.kind).collect();
    assert!(kinds.contains(&EventKind::ShutdownRequested));
    assert_eq!(kinds.last(), Some(&EventKind::AllStoppedWithin));
}

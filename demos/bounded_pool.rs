//! # Example: Bounded execution pool
//!
//! Six recurring jobs share a pool of two admission permits. Triggers that find the pool
//! full are queued (default [`DeferredPolicy::Queue`]); the noisy `metrics` job opts into
//! `Skip` and simply loses its turn.
//!
//! A change callback prints every job transition.
//!
//! ## Run
//! ```bash
//! cargo run --example bounded_pool
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use jobvisor::{Config, DeferredPolicy, Job, JobError, JobRef, JobState, Scheduler};

fn worker(name: &'static str, work_ms: u64) -> Job {
    Job::from_fn(name, move |ctx: CancellationToken| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(work_ms)) => Ok::<(), JobError>(()),
            _ = ctx.cancelled() => Err(JobError::fail("cancelled")),
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config {
        pool_size: 2,
        grace: Duration::from_secs(2),
        ..Config::default()
    };
    let sched = Scheduler::builder(cfg).build();

    let _changes = sched.on_job_changed(|job| {
        if job.state == JobState::ExecutionDeferred {
            println!("[{}] waiting for a permit", job.name);
        } else {
            println!("[{}] {} -> {}", job.name, job.last_state, job.state);
        }
    });

    for (name, work_ms) in [("ingest", 1_500), ("index", 900), ("report", 1_200)] {
        sched
            .every(Duration::from_secs(2), worker(name, work_ms).into_ref())
            .await;
    }
    let metrics: JobRef = worker("metrics", 200)
        .with_deferred(DeferredPolicy::Skip)
        .into_ref();
    sched.every(Duration::from_secs(1), metrics).await;
    sched
        .n_times_every(3, Duration::from_secs(3), worker("backup", 2_000).into_ref())
        .await?;
    sched.once_now(worker("warmup", 500).into_ref()).await;

    tokio::time::sleep(Duration::from_secs(8)).await;

    println!();
    println!("Entries:");
    for entry in sched.status().await {
        println!(
            " ├─► {} {:<8} {:<20} next={:?}",
            entry.id, entry.job.name, entry.job.state, entry.next
        );
    }
    println!(" └─► free permits: {:?}", sched.available_permits());

    if let Err(err) = sched.shutdown().await {
        eprintln!("shutdown: {err}");
    }
    Ok(())
}

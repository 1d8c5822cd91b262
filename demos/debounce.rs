//! # Example: Debounced rebuilds
//!
//! A burst of "file changed" notifications requests a rebuild each time. Debouncing keeps
//! only the latest request, so the rebuild runs once, two seconds after the burst ends.
//!
//! Events are rendered by the built-in [`LogWriter`](jobvisor::LogWriter).
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example debounce --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobvisor::{Config, Job, JobError, JobRef, LogWriter, Scheduler};

fn rebuild() -> JobRef {
    Job::from_fn("rebuild", |_ctx: CancellationToken| async {
        println!("[rebuild] compiling...");
        tokio::time::sleep(Duration::from_millis(300)).await;
        println!("[rebuild] done");
        Ok::<(), JobError>(())
    })
    .into_ref()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let sched = Scheduler::builder(Config::default())
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    for change in 1..=4 {
        println!("[watcher] change #{change}");
        sched.debounced(Duration::from_secs(2), rebuild()).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    println!("pending entries: {}", sched.status().await.len());

    sched.shutdown().await?;
    Ok(())
}

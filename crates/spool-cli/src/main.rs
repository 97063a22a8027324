//! spool-cli - runs the queue against a simulated worker.
//!
//! Submits N items with random priorities, lets a worker that sometimes
//! fails or hangs chew through them, and prints the DLQ and final status.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use rand::Rng;
use serde::Serialize;
use serde_json::{Value, json};
use spool_core::ports::Processor;
use spool_core::{
    Priority, QueueBuilder, QueueConfig, QueueError, QueueItem, QueueStatus, ReaperLoop,
    WorkerGroup,
};
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spool-cli", about = "Priority job queue demo")]
struct Args {
    /// TOML file with queue settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of items to submit
    #[arg(long, default_value_t = 20)]
    items: usize,

    /// Probability that an attempt fails
    #[arg(long, default_value_t = 0.3)]
    failure_rate: f64,

    /// Probability that an attempt never answers before the timeout
    #[arg(long, default_value_t = 0.05)]
    hang_rate: f64,

    /// Base processing time per attempt
    #[arg(long, default_value_t = 200)]
    work_ms: u64,

    #[arg(long)]
    max_concurrent: Option<usize>,

    #[arg(long)]
    processing_timeout_ms: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn queue_config(&self) -> Result<QueueConfig> {
        let mut config = match &self.config {
            Some(path) => QueueConfig::load(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => QueueConfig::default(),
        };
        if let Some(n) = self.max_concurrent {
            config.max_concurrent = n;
        }
        if let Some(ms) = self.processing_timeout_ms {
            config.processing_timeout_ms = ms;
        }
        Ok(config)
    }
}

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    // ignore: a subscriber may already be installed
    let _ = if json_logs {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}

/// A full queue drains slower than a rate window rolls over.
fn admission_backoff(err: &QueueError) -> Duration {
    match err {
        QueueError::QueueFull { .. } => Duration::from_millis(250),
        _ => Duration::from_millis(100),
    }
}

/// Printed to stdout once the run is over.
#[derive(Serialize)]
struct Report {
    dlq: Vec<QueueItem>,
    status: QueueStatus,
}

/// Worker stand-in: sleeps, then succeeds, fails or overruns the timeout.
struct SimulatedWorker {
    failure_rate: f64,
    hang_rate: f64,
    work: Duration,
    hang: Duration,
}

enum Fate {
    Succeed(Duration),
    Fail(Duration),
    Hang,
}

impl SimulatedWorker {
    fn roll(&self) -> Fate {
        let mut rng = rand::thread_rng();
        let jitter = self.work.mul_f64(rng.gen_range(0.5..1.5));
        if rng.gen_bool(self.hang_rate) {
            Fate::Hang
        } else if rng.gen_bool(self.failure_rate) {
            Fate::Fail(jitter)
        } else {
            Fate::Succeed(jitter)
        }
    }
}

#[async_trait]
impl Processor for SimulatedWorker {
    async fn process(&self, item: &QueueItem) -> Result<Option<Value>, String> {
        match self.roll() {
            Fate::Succeed(took) => {
                sleep(took).await;
                Ok(Some(json!({ "took_ms": took.as_millis() as u64 })))
            }
            Fate::Fail(took) => {
                sleep(took).await;
                Err(format!("simulated failure on attempt {}", item.attempts))
            }
            Fate::Hang => {
                // Answer arrives after the sweep has already failed the attempt.
                sleep(self.hang).await;
                Ok(None)
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    anyhow::ensure!(
        (0.0..=1.0).contains(&args.failure_rate) && (0.0..=1.0).contains(&args.hang_rate),
        "--failure-rate and --hang-rate must be within 0..=1"
    );

    let config = args.queue_config()?;
    let (queue, rx) = QueueBuilder::new(config.clone())
        .build()
        .context("building queue")?;

    let worker = SimulatedWorker {
        failure_rate: args.failure_rate,
        hang_rate: args.hang_rate,
        work: Duration::from_millis(args.work_ms),
        hang: config.processing_timeout() + Duration::from_secs(1),
    };
    let reaper = ReaperLoop::spawn(Arc::clone(&queue));
    let workers = WorkerGroup::spawn(Arc::clone(&queue), rx, Arc::new(worker));

    let submit = async {
        for n in 0..args.items {
            let priority = Priority::ALL[rand::thread_rng().gen_range(0..Priority::ALL.len())];
            loop {
                match queue.enqueue(json!({ "n": n }), priority).await {
                    Ok(_) => break,
                    Err(e) if e.is_admission_rejection() => {
                        sleep(admission_backoff(&e)).await
                    }
                    Err(e) => return Err(e).context("enqueue"),
                }
            }
        }
        Ok::<_, anyhow::Error>(())
    };

    let drain = async {
        submit.await?;
        loop {
            let status = queue.get_status().await;
            info!(
                queued = status.queued,
                processing = status.processing,
                retry_pending = status.retry_pending,
                dlq = status.dlq,
                processed = status.totals.processed,
                "status"
            );
            if status.is_drained() {
                return Ok::<_, anyhow::Error>(());
            }
            sleep(Duration::from_secs(1)).await;
        }
    };

    tokio::select! {
        finished = drain => finished?,
        _ = tokio::signal::ctrl_c() => warn!("interrupted, shutting down"),
    }

    workers.shutdown_and_join().await;
    reaper.shutdown_and_join().await;

    let report = Report {
        dlq: queue.get_dlq_items().await,
        status: queue.get_status().await,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

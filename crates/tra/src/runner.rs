//! Async batch runner.
//!
//! Candidate resolution is CPU-bound and synchronous, so each candidate runs
//! on the blocking pool under its own deadline. A candidate that misses the
//! deadline is cancelled and reported as [`ResolutionError::TimedOut`]; its
//! partial work is discarded.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{info, warn};
use tra_core::{BatchInput, BatchOutput, CandidateInput, CandidateReport, Engine, ItemError, ResolutionError};

use crate::fetch::FetchFailure;

/// Default per-candidate deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Batch output plus the fetchers that failed to deliver
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub output: BatchOutput,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fetch_failures: Vec<FetchFailure>,
}

/// Runs candidates concurrently on the blocking pool
#[derive(Debug, Clone)]
pub struct BatchRunner {
    engine: Engine,
    timeout: Duration,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            timeout: DEFAULT_TIMEOUT,
            concurrency: std::thread::available_parallelism().map_or(4, |n| n.get()),
        }
    }

    /// Set the per-candidate deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many candidates resolve at once.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Resolve one candidate under the deadline
    pub async fn run_candidate(&self, input: CandidateInput) -> Result<CandidateReport, ItemError> {
        let candidate_id = input.candidate_id.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let deadline = Instant::now() + self.timeout;
        let engine = self.engine.clone();
        let flag = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || {
            // queued past the deadline: do not start
            if Instant::now() >= deadline {
                flag.store(true, Ordering::Relaxed);
            }
            engine.run_candidate(input, &flag)
        });

        let timed_out = |candidate_id: String| {
            let err = ResolutionError::TimedOut {
                candidate_id,
                millis: self.timeout.as_millis() as u64,
            };
            warn!(candidate = %err.candidate_id(), "candidate timed out");
            ItemError::from(err)
        };

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(Err(ResolutionError::Cancelled { candidate_id }))) => Err(timed_out(candidate_id)),
            Ok(Ok(result)) => result.map_err(ItemError::from),
            Ok(Err(join)) => {
                warn!(candidate = %candidate_id, error = %join, "candidate task failed");
                Err(ItemError {
                    item_id: candidate_id,
                    error: format!("task failed: {}", join),
                })
            }
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                Err(timed_out(candidate_id))
            }
        }
    }

    /// Resolve a whole batch. Output order follows candidate order.
    pub async fn run(&self, batch: BatchInput) -> BatchOutput {
        let started = Instant::now();
        let prepared = self.engine.prepare(batch);
        let total = prepared.candidates.len();

        let mut results: Vec<(usize, Result<CandidateReport, ItemError>)> = stream::iter(
            prepared
                .candidates
                .into_iter()
                .enumerate()
                .map(|(i, input)| async move { (i, self.run_candidate(input).await) }),
        )
        .buffer_unordered(self.concurrency)
        .collect()
        .await;
        results.sort_by_key(|(i, _)| *i);

        let mut output = BatchOutput {
            rejected: prepared.rejected,
            ..BatchOutput::default()
        };
        for (_, result) in results {
            match result {
                Ok(report) => output.candidates.push(report),
                Err(e) => output.failures.push(e),
            }
        }

        info!(
            candidates = total,
            resolved = output.candidates.len(),
            failures = output.failures.len(),
            rejected = output.rejected.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch complete"
        );
        output
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}

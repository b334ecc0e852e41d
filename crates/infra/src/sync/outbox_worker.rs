//! Outbox worker for periodic calendar sync.
//!
//! Polls `calendar_sync_outbox` for due intents and hands each batch to the
//! [`CalendarSyncProcessor`]. Join handles are tracked, cancellation is
//! explicit, and every batch runs under a timeout. Closed intents older than
//! the retention period are pruned on a slower cadence.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use eventhub_infra::sync::{OutboxWorker, OutboxWorkerConfig};
//!
//! # async fn example(processor: Arc<eventhub_core::CalendarSyncProcessor>)
//! # -> eventhub_infra::scheduling::SchedulerResult<()> {
//! let mut worker = OutboxWorker::new(
//!     processor,
//!     OutboxWorkerConfig { poll_interval: Duration::from_secs(5), ..Default::default() },
//! );
//!
//! worker.start()?;
//! // ... application runs ...
//! worker.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use eventhub_core::{BatchReport, CalendarSyncProcessor};
use eventhub_domain::constants::OUTBOX_PRUNE_BATCH;
use eventhub_domain::{Result, SyncConfig};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the outbox worker.
#[derive(Debug, Clone)]
pub struct OutboxWorkerConfig {
    /// Maximum number of intents to process per batch
    pub batch_size: usize,
    /// Interval between polling attempts
    pub poll_interval: Duration,
    /// Timeout for processing a single batch
    pub processing_timeout: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
    /// How long closed intents are kept; `None` keeps them forever
    pub retention: Option<Duration>,
    /// Interval between retention passes
    pub cleanup_interval: Duration,
}

impl Default for OutboxWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            poll_interval: Duration::from_secs(15),
            processing_timeout: Duration::from_secs(120),
            join_timeout: Duration::from_secs(5),
            retention: Some(Duration::from_secs(30 * 86_400)),
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl From<&SyncConfig> for OutboxWorkerConfig {
    fn from(config: &SyncConfig) -> Self {
        let retention = (config.retention_days > 0)
            .then(|| Duration::from_secs(u64::from(config.retention_days) * 86_400));
        Self {
            batch_size: config.batch_size.max(1),
            poll_interval: Duration::from_secs(config.interval_seconds.max(1)),
            retention,
            ..Default::default()
        }
    }
}

/// Outbox worker with explicit lifecycle management.
pub struct OutboxWorker {
    processor: Arc<CalendarSyncProcessor>,
    config: OutboxWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl OutboxWorker {
    pub fn new(processor: Arc<CalendarSyncProcessor>, config: OutboxWorkerConfig) -> Self {
        Self { processor, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Start the worker, spawning the background processing task.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let processor = Arc::clone(&self.processor);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(processor, config, cancel).await;
        });

        self.task_handle = Some(handle);
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            batch_size = self.config.batch_size,
            "Outbox worker started"
        );
        Ok(())
    }

    /// Stop the worker and wait for the processing task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(handle) = self.task_handle.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation.cancel();

        let join_timeout = self.config.join_timeout;
        match tokio::time::timeout(join_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "Outbox worker task panicked");
                return Err(SchedulerError::TaskJoinFailed(e.to_string()));
            }
            Err(_) => {
                warn!("Outbox worker task did not complete within timeout");
                return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() });
            }
        }

        info!("Outbox worker stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Process one batch immediately, outside the polling loop.
    pub async fn run_once(&self) -> Result<BatchReport> {
        self.processor.process_due(self.config.batch_size, Utc::now()).await
    }

    /// Prune expired closed intents immediately.
    pub async fn cleanup_once(&self) -> Result<usize> {
        Self::prune_expired(&self.processor, &self.config).await
    }

    async fn prune_expired(
        processor: &CalendarSyncProcessor,
        config: &OutboxWorkerConfig,
    ) -> Result<usize> {
        let Some(retention) = config.retention else {
            return Ok(0);
        };
        let retention = chrono::Duration::from_std(retention)
            .unwrap_or_else(|_| chrono::Duration::days(i64::from(u16::MAX)));
        let cutoff = Utc::now() - retention;

        let mut total = 0;
        loop {
            let deleted = processor.prune_closed(cutoff, OUTBOX_PRUNE_BATCH).await?;
            total += deleted;
            if deleted < OUTBOX_PRUNE_BATCH {
                break;
            }
        }

        if total > 0 {
            info!(deleted = total, cutoff = %cutoff, "Pruned closed sync intents");
        }
        Ok(total)
    }

    async fn process_loop(
        processor: Arc<CalendarSyncProcessor>,
        config: OutboxWorkerConfig,
        cancel: CancellationToken,
    ) {
        let mut last_cleanup = Instant::now();
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Outbox worker process loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.poll_interval) => {
                    let started = Instant::now();

                    match tokio::time::timeout(
                        config.processing_timeout,
                        processor.process_due(config.batch_size, Utc::now()),
                    )
                    .await
                    {
                        Ok(Ok(report)) => log_report(&report, started.elapsed()),
                        Ok(Err(e)) => {
                            error!(error = %e, "Outbox batch processing failed");
                        }
                        Err(_) => {
                            warn!(
                                timeout_secs = config.processing_timeout.as_secs(),
                                "Outbox batch processing timed out"
                            );
                        }
                    }

                    if last_cleanup.elapsed() >= config.cleanup_interval {
                        last_cleanup = Instant::now();
                        if let Err(e) = Self::prune_expired(&processor, &config).await {
                            warn!(error = %e, "Periodic outbox cleanup failed");
                        }
                    }
                }
            }
        }
    }
}

fn log_report(report: &BatchReport, elapsed: Duration) {
    if report.processed == 0 {
        debug!("No due sync intents");
        return;
    }

    info!(
        processed = report.processed,
        sent = report.sent,
        dismissed = report.dismissed,
        retried = report.retried,
        failed = report.failed,
        elapsed_ms = elapsed.as_millis() as u64,
        "Outbox batch processed"
    );
}

impl Drop for OutboxWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("OutboxWorker dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}

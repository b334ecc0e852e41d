//! Cron-driven reminder runs.
//!
//! Wraps a [`ReminderService`] in a `tokio-cron-scheduler` job. Overlapping
//! runs are already refused by the service, so the job only adds a timeout
//! and logging around each tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use eventhub_core::{ReminderReport, ReminderService};
use eventhub_domain::constants::DEFAULT_REMINDER_CRON;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the reminder scheduler.
#[derive(Debug, Clone)]
pub struct ReminderSchedulerConfig {
    /// Six-field cron expression (seconds first).
    pub cron_expression: String,
    /// Timeout applied to a single run.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
}

impl Default for ReminderSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: DEFAULT_REMINDER_CRON.into(),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Reminder scheduler with explicit lifecycle management.
pub struct ReminderScheduler {
    scheduler: Option<JobScheduler>,
    config: ReminderSchedulerConfig,
    service: Arc<ReminderService>,
}

impl ReminderScheduler {
    pub fn new(cron_expression: impl Into<String>, service: Arc<ReminderService>) -> Self {
        let config =
            ReminderSchedulerConfig { cron_expression: cron_expression.into(), ..Default::default() };
        Self::with_config(config, service)
    }

    pub fn with_config(config: ReminderSchedulerConfig, service: Arc<ReminderService>) -> Self {
        Self { scheduler: None, config, service }
    }

    /// Register the reminder job and start the scheduler.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?
            .map_err(|e| SchedulerError::StartFailed(e.to_string()))?;

        self.scheduler = Some(scheduler);
        info!("Reminder scheduler started");
        Ok(())
    }

    /// Shut the scheduler down. A run already in flight finishes on its own.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, scheduler.shutdown())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?
            .map_err(|e| SchedulerError::StopFailed(e.to_string()))?;

        info!("Reminder scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|e| SchedulerError::CreationFailed(e.to_string()))?;

        let service = Arc::clone(&self.service);
        let job_timeout = self.config.job_timeout;

        let job = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let service = Arc::clone(&service);

            Box::pin(async move {
                let started = Instant::now();

                match tokio::time::timeout(job_timeout, service.run(Utc::now())).await {
                    Ok(Ok(Some(report))) => log_report(&report, started.elapsed()),
                    Ok(Ok(None)) => debug!("Reminder tick skipped"),
                    Ok(Err(err)) => error!(error = %err, "Reminder run failed"),
                    Err(_) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "Reminder run timed out");
                    }
                }
            })
        })
        .map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        let job_id = job.guid();
        scheduler
            .add(job)
            .await
            .map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered reminder job");
        Ok(scheduler)
    }
}

fn log_report(report: &ReminderReport, elapsed: Duration) {
    info!(
        candidates = report.candidates.len(),
        sent = report.sent,
        skipped = report.skipped,
        failed = report.failed,
        elapsed_ms = elapsed.as_millis() as u64,
        "Reminder tick finished"
    );
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ReminderScheduler dropped while running; call stop() for a clean shutdown");
        }
    }
}

//! Admin-only maintenance endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use eventhub_core::ReminderReport;
use eventhub_domain::OutboxStats;
use serde::Serialize;
use tracing::info;

use crate::auth::AdminUser;
use crate::context::AppContext;
use crate::routes::{AppError, Envelope};

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/admin/sync/status", get(sync_status))
        .route("/admin/reminders/run", post(run_reminders))
}

#[derive(Debug, Serialize)]
struct SyncStatus {
    calendar_configured: bool,
    outbox: OutboxStats,
}

/// GET /admin/sync/status - Outbox counts per status
async fn sync_status(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Envelope<SyncStatus>>, AppError> {
    let outbox = ctx.outbox.stats().await?;
    let calendar_configured = ctx.config.calendar.calendar_id().is_some()
        && ctx.config.calendar.has_credentials();
    Ok(Envelope::data(SyncStatus { calendar_configured, outbox }))
}

#[derive(Debug, Serialize)]
struct ReminderRun {
    /// `false` when a scheduled run was still in flight.
    ran: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ReminderReport>,
}

/// POST /admin/reminders/run - Manual reminder run
async fn run_reminders(
    State(ctx): State<Arc<AppContext>>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Envelope<ReminderRun>>, AppError> {
    info!(admin_id = %admin.id, "Manual reminder run requested");
    let report = ctx.reminders.run(Utc::now()).await?;
    Ok(Envelope::data(ReminderRun { ran: report.is_some(), report }))
}

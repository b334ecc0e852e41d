//! Application context - dependency injection container

use std::sync::Arc;

use chrono_tz::Tz;
use eventhub_core::{
    CalendarGateway, CalendarSyncProcessor, CredentialProvider, EventService, ReminderNotifier,
    ReminderService, SyncOutbox, VenueService, WebhookService,
};
use eventhub_domain::{Config, EventHubError, Result};
use eventhub_infra::{
    BrevoNotifier, DbManager, GoogleCalendarClient, GoogleOAuthCredentials, HttpClient,
    LoggingNotifier, OutboxWorker, OutboxWorkerConfig, ReminderScheduler, SqliteEventRepository,
    SqliteOutboxRepository, SqliteVenueRepository,
};
use tracing::{error, info, warn};

use crate::auth::TokenVerifier;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,

    // Use cases
    pub events: Arc<EventService>,
    pub venues: Arc<VenueService>,
    pub webhook: Arc<WebhookService>,
    pub reminders: Arc<ReminderService>,

    // Calendar sync
    pub outbox: Arc<dyn SyncOutbox>,
    pub sync_processor: Arc<CalendarSyncProcessor>,

    pub tokens: TokenVerifier,
}

impl AppContext {
    /// Open the database, apply migrations and wire every service from
    /// `config`.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let http = HttpClient::new()?;
        let credentials = GoogleOAuthCredentials::from_config(&config.calendar, http.clone())
            .map(|c| Arc::new(c) as Arc<dyn CredentialProvider>);
        let calendar = GoogleCalendarClient::from_config(&config.calendar, http.clone(), credentials);
        if !calendar.is_configured() {
            warn!("Google Calendar not configured, sync intents will stay queued");
        }

        let notifier: Arc<dyn ReminderNotifier> =
            match config.email.brevo_api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
                Some(key) => Arc::new(BrevoNotifier::new(http, &config.email, key)),
                None => {
                    warn!("BREVO_API_KEY not set, reminders will only be logged");
                    Arc::new(LoggingNotifier)
                }
            };

        Self::with_adapters(config, db, Arc::new(calendar), notifier)
    }

    /// Wire services around already-built adapters.
    pub fn with_adapters(
        config: Config,
        db: Arc<DbManager>,
        calendar: Arc<dyn CalendarGateway>,
        notifier: Arc<dyn ReminderNotifier>,
    ) -> Result<Self> {
        let time_zone = parse_time_zone(&config.reminders.time_zone)?;

        let venue_repo = Arc::new(SqliteVenueRepository::new(Arc::clone(&db)));
        let event_repo = Arc::new(SqliteEventRepository::new(Arc::clone(&db)));
        let outbox: Arc<dyn SyncOutbox> = Arc::new(SqliteOutboxRepository::new(Arc::clone(&db)));

        let events = EventService::new(event_repo.clone(), venue_repo.clone())
            .with_spots_policy(config.events.spots_policy);
        let venues = VenueService::new(venue_repo, event_repo.clone());
        let webhook =
            WebhookService::new(event_repo.clone(), Arc::clone(&outbox), config.webhook.secret.clone());
        let reminders = ReminderService::new(event_repo.clone(), notifier, config.app_url.clone())
            .with_time_zone(time_zone);
        let sync_processor = CalendarSyncProcessor::new(event_repo, Arc::clone(&outbox), calendar)
            .with_max_attempts(config.sync.max_attempts);

        let tokens = TokenVerifier::new(&config.auth.jwt_secret);
        if !tokens.is_configured() {
            warn!("EVENTHUB_JWT_SECRET not set, authenticated routes will reject every request");
        }

        Ok(Self {
            events: Arc::new(events),
            venues: Arc::new(venues),
            webhook: Arc::new(webhook),
            reminders: Arc::new(reminders),
            outbox,
            sync_processor: Arc::new(sync_processor),
            tokens,
            db,
            config,
        })
    }
}

fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| EventHubError::Config(format!("unknown reminder time zone '{name}'")))
}

/// Background jobs owned by the serving process.
pub struct BackgroundJobs {
    outbox_worker: Option<OutboxWorker>,
    reminder_scheduler: Option<ReminderScheduler>,
}

impl BackgroundJobs {
    /// Start the outbox worker and the reminder scheduler when enabled.
    pub async fn start(ctx: &AppContext) -> Result<Self> {
        let outbox_worker = if ctx.config.sync.enabled {
            let mut worker = OutboxWorker::new(
                Arc::clone(&ctx.sync_processor),
                OutboxWorkerConfig::from(&ctx.config.sync),
            );
            worker.start().map_err(|err| {
                error!(error = %err, "failed to start outbox worker");
                EventHubError::from(err)
            })?;
            Some(worker)
        } else {
            info!("Calendar sync disabled");
            None
        };

        let reminder_scheduler = if ctx.config.reminders.enabled {
            let mut scheduler =
                ReminderScheduler::new(ctx.config.reminders.cron.clone(), Arc::clone(&ctx.reminders));
            scheduler.start().await.map_err(|err| {
                error!(error = %err, "failed to start reminder scheduler");
                EventHubError::from(err)
            })?;
            Some(scheduler)
        } else {
            info!("Reminder scheduler disabled");
            None
        };

        Ok(Self { outbox_worker, reminder_scheduler })
    }

    /// Stop every running job. Failures are logged, never returned.
    pub async fn shutdown(mut self) {
        if let Some(worker) = self.outbox_worker.as_mut() {
            if let Err(err) = worker.stop().await {
                warn!(error = %err, "outbox worker did not stop cleanly");
            }
        }
        if let Some(scheduler) = self.reminder_scheduler.as_mut() {
            if let Err(err) = scheduler.stop().await {
                warn!(error = %err, "reminder scheduler did not stop cleanly");
            }
        }
    }
}

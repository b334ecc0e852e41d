//! EventHub - venue and event management service
//!
//! Main entry point: HTTP server plus maintenance commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use eventhub_api::utils::logging::init_tracing;
use eventhub_api::{router, AppContext, BackgroundJobs};
use eventhub_domain::constants::DEFAULT_CLEANUP_PATTERN;
use eventhub_domain::Config;
use regex::RegexBuilder;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "eventhub")]
#[command(about = "Venue and event management API with calendar publishing")]
struct Cli {
    /// Config file (JSON or TOML); the standard locations are searched otherwise
    #[arg(short, long, env = "EVENTHUB_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server with the outbox worker and reminder scheduler
    Serve,
    /// Run the reminder job once and print the report
    SendReminders,
    /// Delete events whose title matches a pattern
    CleanupEvents {
        /// Case-insensitive regular expression matched against titles
        #[arg(short, long, default_value = DEFAULT_CLEANUP_PATTERN)]
        pattern: String,

        /// List matches without deleting
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => tracing::debug!(error = %err, "No .env loaded"),
    }

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let ctx = Arc::new(AppContext::new(config).context("failed to initialise application")?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(ctx).await,
        Commands::SendReminders => send_reminders(&ctx).await,
        Commands::CleanupEvents { pattern, dry_run } => cleanup_events(&ctx, &pattern, dry_run).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let mut config = eventhub_infra::config::load_from_file(Some(path))?;
            eventhub_infra::config::apply_env(&mut config)?;
            config
        }
        None => eventhub_infra::config::load()?,
    };
    Ok(config)
}

async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let jobs = BackgroundJobs::start(&ctx).await.context("failed to start background jobs")?;

    let addr = ctx.config.server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "EventHub listening");

    let result = axum::serve(listener, router(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    jobs.shutdown().await;
    info!("EventHub stopped");
    result.context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn send_reminders(ctx: &AppContext) -> Result<()> {
    let Some(report) = ctx.reminders.run(Utc::now()).await? else {
        warn!("Another reminder run is in progress");
        return Ok(());
    };

    println!(
        "Window {} .. {}: {} candidate(s), {} sent, {} skipped, {} failed",
        report.window_start.to_rfc3339(),
        report.window_end.to_rfc3339(),
        report.candidates.len(),
        report.sent,
        report.skipped,
        report.failed
    );
    for candidate in &report.candidates {
        println!(
            "  {} {:?} starts {} ({:.1}h){}",
            candidate.event_id,
            candidate.title,
            candidate.start_date.to_rfc3339(),
            candidate.hours_until,
            if candidate.has_email { "" } else { " [no organizer e-mail]" }
        );
    }
    Ok(())
}

async fn cleanup_events(ctx: &AppContext, pattern: &str, dry_run: bool) -> Result<()> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("invalid pattern '{pattern}'"))?;

    let report = ctx.events.purge_matching(&regex, dry_run).await?;

    for (id, title) in &report.matched {
        println!("  {id} {title:?}");
    }
    if report.dry_run {
        println!("{} event(s) match, nothing deleted (dry run)", report.matched.len());
    } else {
        println!("Deleted {} of {} matching event(s)", report.deleted, report.matched.len());
    }
    Ok(())
}

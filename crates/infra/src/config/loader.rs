//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Start from `Config::default()`
//! 2. Replace it with the first config file found, if any
//! 3. Apply environment overrides on top
//!
//! ## Environment Variables
//! - `EVENTHUB_BIND_ADDRESS`: HTTP listen address
//! - `EVENTHUB_DB_PATH`, `EVENTHUB_DB_POOL_SIZE`: SQLite file and pool size
//! - `EVENTHUB_JWT_SECRET`: HS256 secret for bearer tokens
//! - `GOOGLE_CALENDAR_CLIENT_ID`, `GOOGLE_CALENDAR_CLIENT_SECRET`,
//!   `GOOGLE_CALENDAR_REFRESH_TOKEN`, `GOOGLE_CALENDAR_CALENDAR_ID`
//! - `GOOGLE_WEBHOOK_SECRET`: expected push notification secret
//! - `APP_URL`: public base URL used in reminder links
//! - `BREVO_API_KEY`, `EVENTHUB_EMAIL_SENDER`, `EVENTHUB_EMAIL_SENDER_NAME`
//! - `EVENTHUB_REMINDERS_ENABLED`, `EVENTHUB_REMINDERS_CRON`
//! - `EVENTHUB_SYNC_ENABLED`, `EVENTHUB_SYNC_INTERVAL`,
//!   `EVENTHUB_SYNC_MAX_ATTEMPTS`, `EVENTHUB_SYNC_RETENTION_DAYS`
//! - `EVENTHUB_SPOTS_POLICY`: `reject`, `clamp` or `allow_negative`
//!
//! ## File Locations
//! `config.{json,toml}` and `eventhub.{json,toml}` are searched in the working
//! directory, its two parents, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use eventhub_domain::{Config, EventHubError, Result, SpotsPolicy};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "eventhub.json", "eventhub.toml"];

/// Load configuration from the first config file found plus the environment.
///
/// # Errors
/// Returns `EventHubError::Config` if a found file cannot be parsed or an
/// environment override has an invalid value.
pub fn load() -> Result<Config> {
    let mut config = match discover_config_path() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            Config::default()
        }
    };

    apply_env(&mut config)?;
    Ok(config)
}

/// Defaults plus environment overrides, ignoring config files.
///
/// # Errors
/// Returns `EventHubError::Config` for unparsable values.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env(&mut config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches the standard locations. JSON or TOML is
/// chosen by extension.
///
/// # Errors
/// Returns `EventHubError::Config` if the file is missing or malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(EventHubError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => discover_config_path().ok_or_else(|| {
            EventHubError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| EventHubError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| EventHubError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| EventHubError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(EventHubError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations.
pub fn discover_config_path() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Apply every recognised environment variable onto `config`.
///
/// # Errors
/// Returns `EventHubError::Config` naming the offending variable.
pub fn apply_env(config: &mut Config) -> Result<()> {
    if let Some(v) = env_string("EVENTHUB_BIND_ADDRESS") {
        config.server.bind_address = v;
    }

    if let Some(v) = env_string("EVENTHUB_DB_PATH") {
        config.database.path = v;
    }
    if let Some(v) = env_parse::<u32>("EVENTHUB_DB_POOL_SIZE")? {
        config.database.pool_size = v;
    }

    if let Some(v) = env_string("EVENTHUB_JWT_SECRET") {
        config.auth.jwt_secret = v;
    }

    let calendar = &mut config.calendar;
    override_opt(&mut calendar.client_id, "GOOGLE_CALENDAR_CLIENT_ID");
    override_opt(&mut calendar.client_secret, "GOOGLE_CALENDAR_CLIENT_SECRET");
    override_opt(&mut calendar.refresh_token, "GOOGLE_CALENDAR_REFRESH_TOKEN");
    override_opt(&mut calendar.calendar_id, "GOOGLE_CALENDAR_CALENDAR_ID");
    override_opt(&mut config.webhook.secret, "GOOGLE_WEBHOOK_SECRET");

    if let Some(v) = env_string("APP_URL") {
        config.app_url = v;
    }

    override_opt(&mut config.email.brevo_api_key, "BREVO_API_KEY");
    if let Some(v) = env_string("EVENTHUB_EMAIL_SENDER") {
        config.email.sender_email = v;
    }
    if let Some(v) = env_string("EVENTHUB_EMAIL_SENDER_NAME") {
        config.email.sender_name = v;
    }

    config.reminders.enabled = env_bool("EVENTHUB_REMINDERS_ENABLED", config.reminders.enabled);
    if let Some(v) = env_string("EVENTHUB_REMINDERS_CRON") {
        config.reminders.cron = v;
    }

    config.sync.enabled = env_bool("EVENTHUB_SYNC_ENABLED", config.sync.enabled);
    if let Some(v) = env_parse::<u64>("EVENTHUB_SYNC_INTERVAL")? {
        config.sync.interval_seconds = v;
    }
    if let Some(v) = env_parse::<u32>("EVENTHUB_SYNC_MAX_ATTEMPTS")? {
        config.sync.max_attempts = v;
    }
    if let Some(v) = env_parse::<u32>("EVENTHUB_SYNC_RETENTION_DAYS")? {
        config.sync.retention_days = v;
    }

    if let Some(v) = env_string("EVENTHUB_SPOTS_POLICY") {
        config.events.spots_policy = SpotsPolicy::from_str(&v)
            .map_err(|e| EventHubError::Config(format!("Invalid EVENTHUB_SPOTS_POLICY: {e}")))?;
    }

    Ok(())
}

/// Non-empty, trimmed value of an environment variable.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn override_opt(field: &mut Option<String>, key: &str) {
    if let Some(v) = env_string(key) {
        *field = Some(v);
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|s| s.parse::<T>().map_err(|e| EventHubError::Config(format!("Invalid {key}: {e}"))))
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    env_string(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_KEYS: [&str; 20] = [
        "EVENTHUB_BIND_ADDRESS",
        "EVENTHUB_DB_PATH",
        "EVENTHUB_DB_POOL_SIZE",
        "EVENTHUB_JWT_SECRET",
        "GOOGLE_CALENDAR_CLIENT_ID",
        "GOOGLE_CALENDAR_CLIENT_SECRET",
        "GOOGLE_CALENDAR_REFRESH_TOKEN",
        "GOOGLE_CALENDAR_CALENDAR_ID",
        "GOOGLE_WEBHOOK_SECRET",
        "APP_URL",
        "BREVO_API_KEY",
        "EVENTHUB_EMAIL_SENDER",
        "EVENTHUB_EMAIL_SENDER_NAME",
        "EVENTHUB_REMINDERS_ENABLED",
        "EVENTHUB_REMINDERS_CRON",
        "EVENTHUB_SYNC_ENABLED",
        "EVENTHUB_SYNC_INTERVAL",
        "EVENTHUB_SYNC_MAX_ATTEMPTS",
        "EVENTHUB_SYNC_RETENTION_DAYS",
        "EVENTHUB_SPOTS_POLICY",
    ];

    fn clear_env() {
        for key in ALL_KEYS {
            std::env::remove_var(key);
        }
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (value, expected) in
            [("1", true), ("TRUE", true), ("yes", true), ("on", true), ("0", false), ("off", false)]
        {
            std::env::set_var("EVENTHUB_TEST_BOOL", value);
            assert_eq!(env_bool("EVENTHUB_TEST_BOOL", !expected), expected, "value {value}");
        }

        std::env::remove_var("EVENTHUB_TEST_BOOL");
        assert!(env_bool("EVENTHUB_TEST_BOOL", true));
        assert!(!env_bool("EVENTHUB_TEST_BOOL", false));
    }

    #[test]
    fn test_load_from_env_without_vars_is_default() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        assert_eq!(load_from_env().unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("EVENTHUB_DB_PATH", "/tmp/events.db");
        std::env::set_var("EVENTHUB_DB_POOL_SIZE", "3");
        std::env::set_var("GOOGLE_CALENDAR_CALENDAR_ID", "team@group.calendar.google.com");
        std::env::set_var("GOOGLE_WEBHOOK_SECRET", "whsec");
        std::env::set_var("APP_URL", "https://events.example.com");
        std::env::set_var("EVENTHUB_REMINDERS_ENABLED", "off");
        std::env::set_var("EVENTHUB_SYNC_INTERVAL", "30");
        std::env::set_var("EVENTHUB_SYNC_RETENTION_DAYS", "7");
        std::env::set_var("EVENTHUB_SPOTS_POLICY", "clamp");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.database.path, "/tmp/events.db");
        assert_eq!(config.database.pool_size, 3);
        assert_eq!(config.calendar.calendar_id(), Some("team@group.calendar.google.com"));
        assert_eq!(config.webhook.secret.as_deref(), Some("whsec"));
        assert_eq!(config.app_url, "https://events.example.com");
        assert!(!config.reminders.enabled);
        assert_eq!(config.sync.interval_seconds, 30);
        assert_eq!(config.sync.retention_days, 7);
        assert_eq!(config.events.spots_policy, SpotsPolicy::Clamp);
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("EVENTHUB_DB_POOL_SIZE", "lots");
        let err = load_from_env().unwrap_err();
        clear_env();

        assert!(matches!(err, EventHubError::Config(msg) if msg.contains("EVENTHUB_DB_POOL_SIZE")));
    }

    #[test]
    fn test_load_from_env_invalid_policy() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("EVENTHUB_SPOTS_POLICY", "sometimes");
        let err = load_from_env().unwrap_err();
        clear_env();

        assert!(matches!(err, EventHubError::Config(_)));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("BREVO_API_KEY", "  ");
        let config = load_from_env().unwrap();
        clear_env();

        assert!(config.email.brevo_api_key.is_none());
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "config.json",
            r#"{"database": {"path": "test.db", "pool_size": 4}, "sync": {"interval_seconds": 20}}"#,
        );

        let config = load_from_file(Some(path)).unwrap();
        assert_eq!(config.database.path, "test.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.sync.interval_seconds, 20);
        assert_eq!(config.sync.batch_size, 50);
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "eventhub.toml",
            r#"
app_url = "https://events.example.com"

[reminders]
cron = "0 30 * * * *"
time_zone = "Europe/Paris"

[events]
spots_policy = "allow_negative"
"#,
        );

        let config = load_from_file(Some(path)).unwrap();
        assert_eq!(config.app_url, "https://events.example.com");
        assert_eq!(config.reminders.cron, "0 30 * * * *");
        assert_eq!(config.reminders.time_zone, "Europe/Paris");
        assert_eq!(config.events.spots_policy, SpotsPolicy::AllowNegative);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, EventHubError::Config(_)));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "config.json", r#"{ "this is": "not valid json" "#);

        assert!(load_from_file(Some(path)).is_err());
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("server: {}", Path::new("config.yaml"));
        assert!(matches!(result, Err(EventHubError::Config(msg)) if msg.contains("yaml")));
    }
}

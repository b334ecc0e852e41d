//! Configuration loading
//!
//! Builds the application [`Config`](eventhub_domain::Config) from config
//! files and environment variables.

pub mod loader;

pub use loader::{apply_env, load, load_from_env, load_from_file, discover_config_path};

mod config;
pub mod database;
pub mod seed;

pub use config::Config;
pub use database::{Database, Document, DocumentKind, KeyValueStore};

use std::path::PathBuf;

/// Returns `~/.config/carelog[-dev]/` based on CARELOG_ENV.
///
/// Set CARELOG_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CARELOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("carelog-dev")
    } else {
        base_dir.join("carelog")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

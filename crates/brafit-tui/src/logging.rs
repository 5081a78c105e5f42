//! File logging. The terminal belongs to the UI, so log lines go to a file.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BRAFIT_LOG";
const DEFAULT_LEVEL: &str = "info";

pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("brafit")
        .join("brafit.log")
}

/// `BRAFIT_LOG` wins, then the configured level, then `info`.
fn build_filter(configured: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(configured.unwrap_or(DEFAULT_LEVEL))
        .map_err(|e| anyhow!("Invalid log level {:?}: {}", configured, e))
}

pub fn init(log_file: Option<&Path>, configured_level: Option<&str>) -> Result<PathBuf> {
    let path = log_file.map(Path::to_path_buf).unwrap_or_else(default_log_path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured_level)?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(path)
}

//! Logging configuration using tracing
//!
//! The terminal belongs to the UI, so events go to `kalo.log` in the
//! platform data directory. The filter is read from `KALO_LOG`:
//!
//! ```bash
//! KALO_LOG=debug kalo
//! KALO_LOG=kalo_core=trace kalo
//! ```

use crate::settings::project_dirs;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "kalo.log";
const DEFAULT_FILTER: &str = "kalo=info,kalo_core=info";

pub fn log_directory() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Installs the global subscriber and returns the log file path.
pub fn init() -> io::Result<PathBuf> {
    let dir = log_directory();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter =
        EnvFilter::try_from_env("KALO_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    tracing::info!("Kalo starting, logging to {}", path.display());
    Ok(path)
}

// logging.rs

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

pub const LOG_FILE: &str = "app.log";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("logging already initialised")]
    AlreadyInitialised,
    #[error("failed to install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global subscriber. Events go to `<log_dir>/app.log`; if the
/// file cannot be opened they go to stderr. Returns the file in use, if any.
pub fn init_logging(log_dir: &Path) -> Result<Option<PathBuf>, InitError> {
    INITIALISED
        .set(())
        .map_err(|_| InitError::AlreadyInitialised)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let path = log_dir.join(LOG_FILE);
    let file = fs::create_dir_all(log_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));

    match file {
        Ok(file) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            Registry::default().with(filter).with(fmt_layer).try_init()?;
            Ok(Some(path))
        }
        Err(e) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr);
            Registry::default().with(filter).with(fmt_layer).try_init()?;
            tracing::warn!(path = %path.display(), "cannot open log file, logging to stderr: {}", e);
            Ok(None)
        }
    }
}

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PILGRIM_LOG";
const DEFAULT_DIRECTIVE: &str = "pilgrim=info";

/// Sends tracing output to an append-only log file.
///
/// The terminal belongs to the TUI, so nothing is written to stdout or stderr and
/// ANSI colouring is off. `PILGRIM_LOG` takes the usual `EnvFilter` directives.
pub fn init(log_path: &Path) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // A second init in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pilgrim starting");
    Ok(())
}

//! Log setup. The terminal is in raw mode while the program runs, so logs
//! go to a file; nothing may write to stdout or stderr behind the painter's
//! back.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs a file-backed subscriber. `RUST_LOG` controls the filter, with
/// `info` as the default.
pub fn init_file_logging(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

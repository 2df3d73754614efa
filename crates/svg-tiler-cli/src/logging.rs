//! Logging setup.
//!
//! One-shot commands log to stderr so stdout stays clean for piped output.
//! The TUI owns the terminal, so it logs to `svg-tiler.log` instead.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Log file used while the TUI is running.
pub const LOG_FILE: &str = "svg-tiler.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging(target: LogTarget) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match target {
        LogTarget::Stderr => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogTarget::File => {
            // If the log file can't be opened, run without logging rather than fail.
            match OpenOptions::new().create(true).append(true).open(LOG_FILE) {
                Ok(file) => {
                    let fmt_layer = fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_target(true)
                        .with_level(true)
                        .with_thread_names(true)
                        .with_line_number(true);

                    tracing_subscriber::registry()
                        .with(env_filter)
                        .with(fmt_layer)
                        .try_init()?;
                }
                Err(_) => {
                    tracing_subscriber::registry().with(env_filter).try_init()?;
                }
            }
        }
    }

    Ok(())
}

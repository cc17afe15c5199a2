//! Tracing setup
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs
//! - `RUST_LOG=ctags_highlighter::ctags=debug` - module-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/ctags-highlighter/logs/highlighter.log` with
//! daily rotation, at debug level. In channel mode that file is the only sink:
//! stdout and stdin belong to the editor.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config_paths::{ensure_logs_dir, LOG_FILE_PREFIX};

/// Initialize tracing with file logging and, if `console`, a stderr layer
pub fn init(console: bool) {
    let console_layer = console.then(|| {
        let console_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_line_number(true)
            .with_filter(console_filter)
    });

    // File layer - always debug level for troubleshooting
    let file_layer = match ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            if console {
                eprintln!("Warning: Could not initialize file logging: {}", e);
            }
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

//! The editor seen from the highlighter
//!
//! Everything the highlighter needs from its host goes through [`Host`], so
//! the core operations run the same against a live editor channel, the
//! standalone command line, or a fake in tests.

use std::io::Write;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::ConfigKey;
use crate::error::{HighlighterError, Result};
use crate::syntax_command::CommandBatch;

/// Expression evaluating to the current buffer's filetype
pub const FILETYPE_EXPR: &str = "&filetype";

/// Operations the highlighter performs against its editor
pub trait Host {
    /// Called once before the configuration is first read
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Fetch a raw configuration value
    fn get_config(&mut self, key: ConfigKey) -> Result<Value>;

    /// Evaluate an editor expression
    fn eval(&mut self, expr: &str) -> Result<Value>;

    /// Absolute path of the file backing the current buffer
    fn current_buffer_path(&mut self) -> Result<PathBuf>;

    /// Execute a batch of syntax commands
    fn run_batch(&mut self, batch: &CommandBatch) -> Result<()>;

    /// Show a short status message
    fn notify(&mut self, message: &str) -> Result<()>;

    /// The current filetype, empty when unset
    fn filetype(&mut self) -> Result<String> {
        match self.eval(FILETYPE_EXPR)? {
            Value::String(filetype) => Ok(filetype),
            Value::Null => Ok(String::new()),
            other => Err(HighlighterError::Host(format!(
                "{} evaluated to {}",
                FILETYPE_EXPR, other
            ))),
        }
    }
}

/// Host for one-shot command line use
///
/// Configuration comes from a YAML document, buffer state from arguments,
/// and the rendered batch is written to `out`.
pub struct StandaloneHost<W: Write> {
    config: Value,
    filetype: String,
    buffer: PathBuf,
    out: W,
}

impl<W: Write> StandaloneHost<W> {
    pub fn new(config: Value, filetype: impl Into<String>, buffer: PathBuf, out: W) -> Self {
        Self {
            config,
            filetype: filetype.into(),
            buffer,
            out,
        }
    }

    /// Parse the YAML config document into raw values
    pub fn from_yaml(
        content: &str,
        filetype: impl Into<String>,
        buffer: PathBuf,
        out: W,
    ) -> Result<Self> {
        let config: Value = if content.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(content).map_err(|e| HighlighterError::config("config.yaml", e))?
        };
        Ok(Self::new(config, filetype, buffer, out))
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

impl<W: Write> Host for StandaloneHost<W> {
    fn get_config(&mut self, key: ConfigKey) -> Result<Value> {
        Ok(self
            .config
            .get(key.name())
            .cloned()
            .unwrap_or_else(|| key.default_value()))
    }

    fn eval(&mut self, expr: &str) -> Result<Value> {
        match expr {
            FILETYPE_EXPR => Ok(Value::String(self.filetype.clone())),
            _ => Err(HighlighterError::Host(format!(
                "cannot evaluate `{}` outside the editor",
                expr
            ))),
        }
    }

    fn current_buffer_path(&mut self) -> Result<PathBuf> {
        Ok(self.buffer.clone())
    }

    fn run_batch(&mut self, batch: &CommandBatch) -> Result<()> {
        writeln!(self.out, "{}", batch.render())?;
        self.out.flush()?;
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        tracing::info!("{}", message);
        Ok(())
    }
}

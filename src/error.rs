//! Errors surfaced by highlighter operations
//!
//! Indexer failures are deliberately absent: a failed ctags run is
//! treated as "no tags" and never reaches the caller.

/// Errors that can terminate an `update` or `clear` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlighterError {
    /// The editor could not be reached or rejected a request
    Host(String),
    /// A configuration value is missing or malformed
    Config { key: String, message: String },
    /// Local I/O failure (config file, channel stream)
    Io(String),
}

impl HighlighterError {
    pub fn config(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Config {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for HighlighterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(msg) => write!(f, "editor request failed: {}", msg),
            Self::Config { key, message } => write!(f, "invalid config `{}`: {}", key, message),
            Self::Io(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for HighlighterError {}

impl From<std::io::Error> for HighlighterError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HighlighterError>;

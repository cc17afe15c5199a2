//! ctags-highlighter - project-wide tag highlighting for Vim
//!
//! Runs ctags over the current buffer's project, groups the discovered tags
//! by kind and turns the configured rules into `syntax keyword` / `syntax
//! match` commands for the editor to execute.

pub mod channel;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod ctags;
pub mod error;
pub mod highlighter;
pub mod host;
pub mod project_root;
pub mod syntax_command;
pub mod tracing;

// Re-export commonly used types
pub use config::{HighlighterConfig, RuleMode, SyntaxRule};
pub use ctags::{CtagsIndexer, TagIndexer, TagsByKind};
pub use error::HighlighterError;
pub use highlighter::{Outcome, Session};
pub use host::Host;
pub use syntax_command::{CommandBatch, SyntaxCommand};

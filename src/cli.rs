//! Command-line argument parsing
//!
//! Supports:
//! - Serving an editor over a JSON channel on stdin/stdout (default)
//! - One-shot update/clear printing the command batch to stdout

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::ctags::CTAGS_PROGRAM;

/// Highlight ctags identifiers in Vim
#[derive(Parser, Debug)]
#[command(name = "ctags-highlighter", version, about)]
pub struct CliArgs {
    /// ctags executable to run
    #[arg(long, env = "CTAGS", value_name = "PATH", default_value = CTAGS_PROGRAM)]
    pub ctags: PathBuf,

    /// Also log to stderr (ignored when serving, where stdio is the channel)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Serve editor requests over a JSON channel on stdin/stdout
    Serve,
    /// Print the commands highlighting the tags of a buffer's project
    Update(BufferArgs),
    /// Print the commands clearing a filetype's highlight groups
    Clear(BufferArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BufferArgs {
    /// Editor filetype of the buffer (e.g. `cpp`, `python`)
    #[arg(short, long)]
    pub filetype: String,

    /// Path of the file backing the buffer
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Config file (defaults to ~/.config/ctags-highlighter/config.yaml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// The subcommand to run, `serve` when none was given
    pub fn command(&self) -> CliCommand {
        self.command.clone().unwrap_or(CliCommand::Serve)
    }

    /// Whether stdout/stdin carry the editor channel
    pub fn is_channel(&self) -> bool {
        self.command() == CliCommand::Serve
    }
}

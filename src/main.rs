use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;

use ctags_highlighter::channel::ChannelHost;
use ctags_highlighter::cli::{BufferArgs, CliArgs, CliCommand};
use ctags_highlighter::config_paths;
use ctags_highlighter::host::StandaloneHost;
use ctags_highlighter::{CtagsIndexer, Outcome, Session};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    ctags_highlighter::tracing::init(args.verbose && !args.is_channel());

    let indexer = CtagsIndexer::new(args.ctags.clone());
    tracing::info!("Using ctags at {}", indexer.program().display());

    match args.command() {
        CliCommand::Serve => {
            let mut host = ChannelHost::new(io::stdin().lock(), io::stdout().lock());
            let mut session = Session::new(indexer);
            host.serve(&mut session).context("Editor channel failed")?;
        }
        CliCommand::Update(buffer) => run_once(buffer, indexer, true)?,
        CliCommand::Clear(buffer) => run_once(buffer, indexer, false)?,
    }

    Ok(())
}

/// Run one update or clear against a config file, printing the batch
fn run_once(buffer: BufferArgs, indexer: CtagsIndexer, update: bool) -> Result<()> {
    let content = read_config(buffer.config)?;
    let file = absolute(buffer.file)?;

    let mut host = StandaloneHost::from_yaml(&content, buffer.filetype, file, io::stdout().lock())?;
    let mut session = Session::new(indexer);
    let outcome = if update {
        session.update(&mut host)?
    } else {
        session.clear(&mut host)?
    };

    if let Outcome::Skipped { filetype } = outcome {
        tracing::warn!("No syntax rules configured for filetype {:?}", filetype);
    }
    Ok(())
}

/// An explicit config path must exist; a missing default config means no rules
fn read_config(explicit: Option<PathBuf>) -> Result<String> {
    if let Some(path) = explicit {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()));
    }

    let Some(path) = config_paths::config_file() else {
        tracing::debug!("No config directory available, using empty config");
        return Ok(String::new());
    };

    if !path.exists() {
        tracing::debug!("Config file not found at {}, using empty config", path.display());
        return Ok(String::new());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(content)
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

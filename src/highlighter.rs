//! Update and clear operations
//!
//! The core functions take the configuration explicitly; [`Session`] is the
//! outer state that loads it from the host on first use.

use crate::config::HighlighterConfig;
use crate::ctags::{CtagsInvocation, TagIndexer};
use crate::error::Result;
use crate::host::Host;
use crate::project_root::ScanTarget;
use crate::syntax_command::{clear_commands, update_commands, CommandBatch};

pub const UPDATED_MESSAGE: &str = "Highlighter: updated";
pub const CLEARED_MESSAGE: &str = "Highlighter: cleared";

/// Result of one editor command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The filetype is empty or has no rules; nothing was sent
    Skipped { filetype: String },
    Updated(CommandBatch),
    Cleared(CommandBatch),
}

/// Re-scan the project and apply highlighting for the current filetype
pub fn update<H, I>(host: &mut H, config: &HighlighterConfig, indexer: &I) -> Result<Outcome>
where
    H: Host + ?Sized,
    I: TagIndexer + ?Sized,
{
    let filetype = host.filetype()?;
    let Some(rules) = config.rules_for(&filetype) else {
        tracing::debug!("No syntax rules for filetype {:?}, skipping update", filetype);
        return Ok(Outcome::Skipped { filetype });
    };

    let buffer = host.current_buffer_path()?;
    let target = ScanTarget::resolve(&buffer, &config.project_root_signs);
    let invocation = CtagsInvocation::new(&target, &config.ctags_options, &filetype);
    let tags = indexer.index(&invocation);

    let batch = CommandBatch {
        commands: update_commands(rules, &tags),
        root: target.path().to_path_buf(),
        filetype,
    };
    tracing::info!(
        "Updating {} highlight rules for {} ({} tags, {} commands)",
        rules.len(),
        batch.filetype,
        tags.tag_count(),
        batch.highlight_count()
    );

    host.run_batch(&batch)?;
    host.notify(UPDATED_MESSAGE)?;
    Ok(Outcome::Updated(batch))
}

/// Remove highlighting for the current filetype without scanning
pub fn clear<H>(host: &mut H, config: &HighlighterConfig) -> Result<Outcome>
where
    H: Host + ?Sized,
{
    let filetype = host.filetype()?;
    let Some(rules) = config.rules_for(&filetype) else {
        tracing::debug!("No syntax rules for filetype {:?}, skipping clear", filetype);
        return Ok(Outcome::Skipped { filetype });
    };

    let buffer = host.current_buffer_path()?;
    let target = ScanTarget::resolve(&buffer, &config.project_root_signs);
    let batch = CommandBatch {
        commands: clear_commands(rules),
        root: target.path().to_path_buf(),
        filetype,
    };
    tracing::info!("Clearing {} highlight groups for {}", rules.len(), batch.filetype);

    host.run_batch(&batch)?;
    host.notify(CLEARED_MESSAGE)?;
    Ok(Outcome::Cleared(batch))
}

/// Per-editor session: uninitialized until the first command loads the config
pub struct Session<I: TagIndexer> {
    config: Option<HighlighterConfig>,
    indexer: I,
}

impl<I: TagIndexer> Session<I> {
    pub fn new(indexer: I) -> Self {
        Self {
            config: None,
            indexer,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    pub fn update<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<Outcome> {
        let config = match self.config.take() {
            Some(config) => config,
            None => load_config(host)?,
        };
        let config = self.config.insert(config);
        update(host, config, &self.indexer)
    }

    pub fn clear<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<Outcome> {
        let config = match self.config.take() {
            Some(config) => config,
            None => load_config(host)?,
        };
        let config = self.config.insert(config);
        clear(host, config)
    }
}

fn load_config<H: Host + ?Sized>(host: &mut H) -> Result<HighlighterConfig> {
    host.initialize()?;
    let config = HighlighterConfig::from_values(|key| host.get_config(key))?;
    tracing::info!(
        "Loaded highlighter config ({} filetypes, {} root signs)",
        config.syntax.len(),
        config.project_root_signs.len()
    );
    Ok(config)
}

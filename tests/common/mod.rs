//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::PathBuf;

use ctags_highlighter::config::ConfigKey;
use ctags_highlighter::ctags::{parse_tags, CtagsInvocation, TagIndexer, TagsByKind};
use ctags_highlighter::error::{HighlighterError, Result};
use ctags_highlighter::host::{Host, FILETYPE_EXPR};
use ctags_highlighter::CommandBatch;
use serde_json::{json, Value};

/// In-memory editor recording everything the highlighter asks of it
pub struct FakeHost {
    pub config: Value,
    pub filetype: String,
    pub buffer: PathBuf,
    pub initialized: usize,
    pub config_reads: Vec<ConfigKey>,
    pub batches: Vec<CommandBatch>,
    pub messages: Vec<String>,
}

impl FakeHost {
    pub fn new(config: Value, filetype: &str, buffer: impl Into<PathBuf>) -> Self {
        Self {
            config,
            filetype: filetype.to_string(),
            buffer: buffer.into(),
            initialized: 0,
            config_reads: Vec::new(),
            batches: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Rendered command lines sent so far
    pub fn rendered(&self) -> Vec<String> {
        self.batches.iter().map(CommandBatch::render).collect()
    }
}

impl Host for FakeHost {
    fn initialize(&mut self) -> Result<()> {
        self.initialized += 1;
        Ok(())
    }

    fn get_config(&mut self, key: ConfigKey) -> Result<Value> {
        self.config_reads.push(key);
        self.config.get(key.vim_variable()).cloned().ok_or_else(|| {
            HighlighterError::Host(format!("undefined variable {}", key.vim_variable()))
        })
    }

    fn eval(&mut self, expr: &str) -> Result<Value> {
        match expr {
            FILETYPE_EXPR => Ok(Value::String(self.filetype.clone())),
            _ => Err(HighlighterError::Host(format!("unexpected eval {}", expr))),
        }
    }

    fn current_buffer_path(&mut self) -> Result<PathBuf> {
        Ok(self.buffer.clone())
    }

    fn run_batch(&mut self, batch: &CommandBatch) -> Result<()> {
        self.batches.push(batch.clone());
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        self.messages.push(message.to_string());
        Ok(())
    }
}

/// Indexer returning canned ctags output and recording each invocation
pub struct RecordingIndexer {
    tags: TagsByKind,
    pub invocations: RefCell<Vec<Vec<String>>>,
}

impl RecordingIndexer {
    pub fn with_output(output: &str) -> Self {
        Self {
            tags: parse_tags(output).expect("valid ctags output"),
            invocations: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.invocations.borrow().len()
    }

    pub fn last_args(&self) -> Vec<String> {
        self.invocations.borrow().last().cloned().unwrap_or_default()
    }
}

impl TagIndexer for RecordingIndexer {
    fn index(&self, invocation: &CtagsInvocation) -> TagsByKind {
        self.invocations.borrow_mut().push(
            invocation
                .args()
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        );
        self.tags.clone()
    }
}

/// Editor variables with the given signs and rules for one filetype
pub fn editor_config(signs: &[&str], filetype: &str, rules: Value) -> Value {
    let mut syntax = serde_json::Map::new();
    syntax.insert(filetype.to_string(), rules);
    json!({
        "g:highlighter#project_root_signs": signs,
        "g:highlighter#ctags_options": [],
        "g:highlighter#syntax": syntax,
    })
}

pub fn keyword_rule(group: &str, kinds: &str) -> Value {
    json!({
        "hlgroup": group,
        "tagkinds": kinds,
        "syntax_type": "keyword",
        "syntax_ignore": "Comment,String",
    })
}

pub fn match_rule(group: &str, kinds: &str) -> Value {
    json!({
        "hlgroup": group,
        "tagkinds": kinds,
        "syntax_type": "match",
        "syntax_ignore": "Comment,String",
        "syntax_prefix": "\\<",
        "syntax_suffix": "\\>",
    })
}

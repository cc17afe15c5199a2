//! Highlighter configuration
//!
//! Read once per session, either from the editor's global variables or from
//! `~/.config/ctags-highlighter/config.yaml` when running standalone, and
//! treated as immutable afterwards.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{HighlighterError, Result};

/// The externally supplied configuration values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    /// File or directory names marking a project root
    ProjectRootSigns,
    /// Extra flags appended to every ctags invocation
    CtagsOptions,
    /// Filetype name -> ordered syntax rules
    Syntax,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [
        ConfigKey::ProjectRootSigns,
        ConfigKey::CtagsOptions,
        ConfigKey::Syntax,
    ];

    /// Key name in `config.yaml`
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ProjectRootSigns => "project_root_signs",
            ConfigKey::CtagsOptions => "ctags_options",
            ConfigKey::Syntax => "syntax",
        }
    }

    /// Editor global variable holding this value
    pub fn vim_variable(&self) -> &'static str {
        match self {
            ConfigKey::ProjectRootSigns => "g:highlighter#project_root_signs",
            ConfigKey::CtagsOptions => "g:highlighter#ctags_options",
            ConfigKey::Syntax => "g:highlighter#syntax",
        }
    }

    /// Value used when a config file omits the key
    pub fn default_value(&self) -> Value {
        match self {
            ConfigKey::ProjectRootSigns | ConfigKey::CtagsOptions => Value::Array(Vec::new()),
            ConfigKey::Syntax => Value::Object(Default::default()),
        }
    }
}

/// Immutable per-session configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlighterConfig {
    pub project_root_signs: Vec<String>,
    pub ctags_options: Vec<String>,
    pub syntax: BTreeMap<String, Vec<SyntaxRule>>,
}

impl HighlighterConfig {
    /// Build the config from raw values, fetching each key exactly once
    pub fn from_values<F>(mut fetch: F) -> Result<Self>
    where
        F: FnMut(ConfigKey) -> Result<Value>,
    {
        Ok(Self {
            project_root_signs: decode(ConfigKey::ProjectRootSigns, &mut fetch)?,
            ctags_options: decode(ConfigKey::CtagsOptions, &mut fetch)?,
            syntax: decode(ConfigKey::Syntax, &mut fetch)?,
        })
    }

    /// Rules for a filetype, if any are configured
    pub fn rules_for(&self, filetype: &str) -> Option<&[SyntaxRule]> {
        if filetype.is_empty() {
            return None;
        }
        self.syntax.get(filetype).map(Vec::as_slice)
    }
}

fn decode<T, F>(key: ConfigKey, fetch: &mut F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnMut(ConfigKey) -> Result<Value>,
{
    let value = fetch(key)?;
    serde_json::from_value(value).map_err(|e| HighlighterError::config(key.name(), e))
}

/// One highlight rule for a filetype
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyntaxRule {
    /// Highlight group receiving the matched tags
    #[serde(rename = "hlgroup")]
    pub group: String,
    /// Tag kind codes this rule applies to, in declaration order
    #[serde(rename = "tagkinds", deserialize_with = "deserialize_kinds")]
    pub kinds: Vec<String>,
    /// Groups the rule must not be contained in
    #[serde(rename = "syntax_ignore", default, deserialize_with = "deserialize_groups")]
    pub exclusions: Vec<String>,
    #[serde(flatten)]
    pub mode: RuleMode,
}

/// How a rule is rendered into an editor command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "syntax_type", rename_all = "lowercase")]
pub enum RuleMode {
    /// `syntax keyword`
    Keyword,
    /// `syntax match` with a pattern wrapped in prefix/suffix
    Match {
        #[serde(rename = "syntax_prefix", default)]
        prefix: String,
        #[serde(rename = "syntax_suffix", default)]
        suffix: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrList {
    Text(String),
    List(Vec<String>),
}

/// `"fp"` and `["f", "p"]` both name kinds `f` and `p`
fn deserialize_kinds<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match TextOrList::deserialize(deserializer)? {
        TextOrList::Text(text) => text.chars().map(String::from).collect(),
        TextOrList::List(list) => list,
    };

    let mut kinds: Vec<String> = Vec::with_capacity(raw.len());
    for kind in raw {
        if !kind.is_empty() && !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// `"Comment,String"` and `["Comment", "String"]` are equivalent
fn deserialize_groups<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let groups = match TextOrList::deserialize(deserializer)? {
        TextOrList::Text(text) => text
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(String::from)
            .collect(),
        TextOrList::List(list) => list,
    };
    Ok(groups)
}

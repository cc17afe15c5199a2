//! Editor syntax commands
//!
//! Rules are matched against the indexed tags into typed [`SyntaxCommand`]s;
//! only at the editor boundary are they rendered to Ex command text.

use std::fmt;
use std::path::PathBuf;

use crate::config::{RuleMode, SyntaxRule};
use crate::ctags::TagsByKind;

/// Separator between Ex commands in one batch
pub const COMMAND_SEPARATOR: &str = " | ";

/// Characters escaped with a backslash inside `syntax match` patterns
const PATTERN_SPECIAL: [char; 9] = ['.', '*', '^', '$', '/', '\\', '~', '[', ']'];

/// A single editor highlight command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCommand {
    /// `syntax clear {group}`
    Clear { group: String },
    /// `syntax keyword {group} {keywords} containedin=ALLBUT,{exclusions}`
    ///
    /// With no exclusions the clause is `containedin=ALL`.
    Keyword {
        group: String,
        keywords: Vec<String>,
        exclusions: Vec<String>,
    },
    /// `syntax match {group} /{pattern}/ containedin=ALLBUT,{exclusions}`
    Match {
        group: String,
        pattern: String,
        exclusions: Vec<String>,
    },
}

impl fmt::Display for SyntaxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxCommand::Clear { group } => write!(f, "syntax clear {}", group),
            SyntaxCommand::Keyword {
                group,
                keywords,
                exclusions,
            } => write!(
                f,
                "syntax keyword {} {} {}",
                group,
                keywords.join(" "),
                ContainedIn(exclusions)
            ),
            SyntaxCommand::Match {
                group,
                pattern,
                exclusions,
            } => write!(
                f,
                "syntax match {} /{}/ {}",
                group,
                pattern,
                ContainedIn(exclusions)
            ),
        }
    }
}

/// The `containedin=` clause for a set of excluded groups
struct ContainedIn<'a>(&'a [String]);

impl fmt::Display for ContainedIn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "containedin=ALL")
        } else {
            write!(f, "containedin=ALLBUT,{}", self.0.join(","))
        }
    }
}

/// Backslash-escape pattern metacharacters in a tag name
pub fn escape_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if PATTERN_SPECIAL.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `{prefix}\%(name1\|name2\)` followed by `{suffix}`
pub fn match_pattern<'a, I>(names: I, prefix: &str, suffix: &str) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let alternatives: Vec<String> = names.into_iter().map(|n| escape_pattern(n)).collect();
    format!("{}\\%({}\\){}", prefix, alternatives.join("\\|"), suffix)
}

impl SyntaxRule {
    /// The reset command for this rule's group
    pub fn clear_command(&self) -> SyntaxCommand {
        SyntaxCommand::Clear {
            group: self.group.clone(),
        }
    }

    /// One command per declared kind that has tags, in declaration order
    pub fn highlight_commands(&self, tags: &TagsByKind) -> Vec<SyntaxCommand> {
        self.kinds
            .iter()
            .filter_map(|kind| tags.names(kind))
            .filter(|names| !names.is_empty())
            .map(|names| match &self.mode {
                RuleMode::Keyword => SyntaxCommand::Keyword {
                    group: self.group.clone(),
                    keywords: names.iter().cloned().collect(),
                    exclusions: self.exclusions.clone(),
                },
                RuleMode::Match { prefix, suffix } => SyntaxCommand::Match {
                    group: self.group.clone(),
                    pattern: match_pattern(names, prefix, suffix),
                    exclusions: self.exclusions.clone(),
                },
            })
            .collect()
    }
}

/// Commands for an update: each rule's clear followed by its highlights
pub fn update_commands(rules: &[SyntaxRule], tags: &TagsByKind) -> Vec<SyntaxCommand> {
    let mut commands = Vec::new();
    for rule in rules {
        commands.push(rule.clear_command());
        commands.extend(rule.highlight_commands(tags));
    }
    commands
}

/// Commands for a clear: exactly one reset per rule
pub fn clear_commands(rules: &[SyntaxRule]) -> Vec<SyntaxCommand> {
    rules.iter().map(SyntaxRule::clear_command).collect()
}

/// Commands executed by the editor in one call, with their context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    pub commands: Vec<SyntaxCommand>,
    /// The path ctags scanned (project root or the buffer itself)
    pub root: PathBuf,
    pub filetype: String,
}

impl CommandBatch {
    /// Render as one `|`-separated Ex command line
    pub fn render(&self) -> String {
        self.commands
            .iter()
            .map(SyntaxCommand::to_string)
            .collect::<Vec<_>>()
            .join(COMMAND_SEPARATOR)
    }

    /// Commands other than group resets
    pub fn highlight_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| !matches!(c, SyntaxCommand::Clear { .. }))
            .count()
    }
}

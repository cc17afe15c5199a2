//! Tag discovery through the external ctags binary
//!
//! ctags is run in table mode writing to stdout:
//!
//! ```text
//! name<TAB>file<TAB>excmd<TAB>kind[<TAB>extension fields...]
//! ```
//!
//! Any failure to run it or to read its output is treated as "no tags".

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::project_root::ScanTarget;

/// Default ctags executable, looked up on PATH
pub const CTAGS_PROGRAM: &str = "ctags";

/// Flags passed on every run: table output to stdout, file order, line numbers
const BASE_FLAGS: [&str; 4] = ["-f", "-", "--sort=no", "--excmd=number"];

/// Map an editor filetype to the ctags `--languages` name
pub fn language_for_filetype(filetype: &str) -> &str {
    match filetype {
        "cpp" => "c++",
        "cs" => "c#",
        other => other,
    }
}

/// Argument vector for one ctags run (program name excluded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtagsInvocation {
    args: Vec<OsString>,
}

impl CtagsInvocation {
    pub fn new(target: &ScanTarget, extra_options: &[String], filetype: &str) -> Self {
        let mut args: Vec<OsString> = BASE_FLAGS.iter().map(OsString::from).collect();
        if target.is_recursive() {
            args.push("-R".into());
        }
        args.extend(extra_options.iter().map(OsString::from));
        args.push(format!("--languages={}", language_for_filetype(filetype)).into());
        args.push(target.path().as_os_str().to_owned());
        Self { args }
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// A single tag reported by ctags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub name: String,
    pub kind: String,
}

/// Distinct tag names grouped by kind code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsByKind {
    kinds: BTreeMap<String, BTreeSet<String>>,
}

impl TagsByKind {
    pub fn insert(&mut self, entry: TagEntry) {
        self.kinds.entry(entry.kind).or_default().insert(entry.name);
    }

    /// Names seen for `kind`, sorted
    pub fn names(&self, kind: &str) -> Option<&BTreeSet<String>> {
        self.kinds.get(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Number of distinct (kind, name) pairs
    pub fn tag_count(&self) -> usize {
        self.kinds.values().map(BTreeSet::len).sum()
    }
}

/// A line of ctags output that does not have the table layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    pub content: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed ctags line {}: {:?}", self.line, self.content)
    }
}

impl std::error::Error for ParseError {}

/// Parse ctags table output
///
/// Blank lines (including the trailing one) and `!_TAG_` pseudo-tags are
/// skipped. A line with fewer than four fields rejects the whole output.
pub fn parse_tags(output: &str) -> Result<TagsByKind, ParseError> {
    let mut tags = TagsByKind::default();

    for (idx, line) in output.lines().enumerate() {
        if line.is_empty() || line.starts_with("!_") {
            continue;
        }

        let mut fields = line.split('\t');
        let name = fields.next().unwrap_or_default();
        let kind = fields.nth(2);

        match kind {
            Some(kind) if !name.is_empty() && !kind.is_empty() => tags.insert(TagEntry {
                name: name.to_string(),
                kind: kind.to_string(),
            }),
            _ => {
                return Err(ParseError {
                    line: idx + 1,
                    content: line.to_string(),
                })
            }
        }
    }

    Ok(tags)
}

/// Source of tags for a scan
pub trait TagIndexer {
    /// Run one scan; failures yield an empty result
    fn index(&self, invocation: &CtagsInvocation) -> TagsByKind;
}

/// Runs the ctags binary as a blocking subprocess
#[derive(Debug, Clone)]
pub struct CtagsIndexer {
    program: PathBuf,
}

impl Default for CtagsIndexer {
    fn default() -> Self {
        Self::new(CTAGS_PROGRAM)
    }
}

impl CtagsIndexer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TagIndexer for CtagsIndexer {
    fn index(&self, invocation: &CtagsInvocation) -> TagsByKind {
        tracing::debug!(
            "Running {} {:?}",
            self.program.display(),
            invocation.args()
        );

        // stdin must stay detached: in channel mode it carries the editor protocol
        let output = match Command::new(&self.program)
            .args(invocation.args())
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to start {}: {}", self.program.display(), e);
                return TagsByKind::default();
            }
        };

        if !output.status.success() {
            tracing::debug!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return TagsByKind::default();
        }

        let text = match String::from_utf8(output.stdout) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("ctags output is not valid UTF-8: {}", e);
                return TagsByKind::default();
            }
        };

        match parse_tags(&text) {
            Ok(tags) => {
                tracing::debug!("Indexed {} tags", tags.tag_count());
                tags
            }
            Err(e) => {
                tracing::warn!("Discarding ctags output: {}", e);
                TagsByKind::default()
            }
        }
    }
}

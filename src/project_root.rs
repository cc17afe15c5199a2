//! Project root discovery
//!
//! Walks upward from a buffer's directory looking for marker files
//! (`.git`, `Cargo.toml`, ...) to decide what ctags should scan.

use std::path::{Path, PathBuf};

/// Find the closest ancestor directory of `file` containing any of `signs`
///
/// The search starts at the file's containing directory, or at `file` itself
/// for a directory buffer (`/m/proj/`), and stops before the filesystem root,
/// which is never reported as a project root. Returns `None` when no signs are
/// configured or no directory matches.
pub fn find_project_root(file: &Path, signs: &[String]) -> Option<PathBuf> {
    if signs.is_empty() {
        return None;
    }

    let mut candidate = if is_directory_buffer(file) {
        file
    } else {
        file.parent()?
    };
    // The filesystem root (and the empty relative base) has no parent
    while let Some(parent) = candidate.parent() {
        if signs.iter().any(|sign| candidate.join(sign).exists()) {
            return Some(candidate.to_path_buf());
        }
        candidate = parent;
    }
    None
}

/// `Path::parent` drops a trailing separator, so check for one explicitly
fn is_directory_buffer(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(std::path::is_separator)
        || path.is_dir()
}

/// What a single ctags run should scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// A discovered project root, scanned recursively
    Project(PathBuf),
    /// No root was found: only the buffer's own path is scanned
    File(PathBuf),
}

impl ScanTarget {
    /// Resolve the scan target for the buffer at `file`
    pub fn resolve(file: &Path, signs: &[String]) -> Self {
        match find_project_root(file, signs) {
            Some(root) => {
                tracing::debug!("Project root for {} is {}", file.display(), root.display());
                ScanTarget::Project(root)
            }
            None => {
                tracing::debug!("No project root for {}, scanning file only", file.display());
                ScanTarget::File(file.to_path_buf())
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ScanTarget::Project(path) | ScanTarget::File(path) => path,
        }
    }

    /// Whether ctags needs `-R` for this target
    ///
    /// A `File` target can still be a directory (e.g. a directory-listing buffer).
    pub fn is_recursive(&self) -> bool {
        match self {
            ScanTarget::Project(_) => true,
            ScanTarget::File(path) => path.is_dir(),
        }
    }
}

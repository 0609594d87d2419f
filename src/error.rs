// Centralized error handling module
// Provides context-rich error types for filter parsing and path evaluation

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for the ghost file engine.
///
/// Only two failure classes abort an operation outright: an unreadable or
/// malformed filter file, and a path handed to the match engine that is not
/// under the declared root. Everything that can go wrong during traversal or
/// deletion is recovered per entry and surfaces in stats/results instead.
#[derive(Debug)]
pub enum GhostError {
    /// Filter file could not be read (missing, permission denied, not UTF-8)
    FilterFileRead { path: PathBuf, reason: String },

    /// Filter file contents are malformed at a specific line
    FilterFileParse { path: PathBuf, line: usize, reason: String },

    /// A rule pattern failed to compile at engine construction. The parser
    /// validates patterns up front, so this only fires on rule sets built
    /// some other way.
    InvalidPattern { pattern: String, line: usize, reason: String },

    /// A path argument is not lexically contained within the scan root
    PathOutsideRoot { path: PathBuf, root: PathBuf },
}

impl fmt::Display for GhostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GhostError::FilterFileRead { path, reason } => {
                write!(f, "Failed to read filter file {}: {}\n", path.display(), reason)?;
                write!(f, "Suggestion: Check that the file exists, is readable, and is UTF-8 text")
            }
            GhostError::FilterFileParse { path, line, reason } => {
                write!(f, "Failed to parse filter file {} at line {}: {}\n", path.display(), line, reason)?;
                write!(f, "Suggestion: Rule lines must start with '-' or '+' followed by a pattern")
            }
            GhostError::InvalidPattern { pattern, line, reason } => {
                write!(f, "Invalid pattern {:?} in rule from line {}: {}\n", pattern, line, reason)?;
                write!(f, "Suggestion: Patterns use gitignore-style globs like **/*.tmp")
            }
            GhostError::PathOutsideRoot { path, root } => {
                write!(f, "Path {} is not in the subpath of root {}\n", path.display(), root.display())?;
                write!(f, "Suggestion: Only paths under the scanned root can be evaluated")
            }
        }
    }
}

impl std::error::Error for GhostError {}

impl GhostError {
    /// Wrap an io::Error that occurred while reading a filter file.
    /// All read-layer failures collapse into FilterFileRead so callers
    /// never have to distinguish I/O subtypes.
    pub fn filter_read(path: &std::path::Path, err: io::Error) -> Self {
        GhostError::FilterFileRead {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

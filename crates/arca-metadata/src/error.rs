//! Metadata-source error types.
//!
//! Errors here are fatal for the load. Per-revision problems during a
//! history walk are not errors at this level; they become
//! [`arca_core::RevisionError`] entries in the skip report.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort loading artifact metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The artifacts directory does not exist.
    #[error("artifacts directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A git invocation could not be spawned or exited unsuccessfully.
    #[error("git {command} failed: {detail}")]
    Git { command: String, detail: String },

    /// Git produced output this loader cannot interpret.
    #[error("unexpected git log output: {line:?}")]
    GitOutput { line: String },

    /// One or more descriptors in the working tree are invalid.
    #[error("one or more artifact files are invalid ({} problems)", .0.len())]
    InvalidArtifacts(Vec<ArtifactProblem>),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Why a single working-tree descriptor was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactProblem {
    /// The file could not be parsed at all.
    Unparseable { path: String, reason: String },
    /// The file parsed but failed field validation.
    Invalid {
        path: String,
        reasons: Vec<FieldProblem>,
    },
}

/// A single failed field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    /// Dotted path of the offending field, e.g. `files[2].cid`.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl fmt::Display for ArtifactProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable { path, reason } => write!(f, "'{path}': {reason}"),
            Self::Invalid { path, reasons } => {
                writeln!(f, "'{path}':")?;
                for problem in reasons {
                    writeln!(f, "    `{}` {}", problem.field, problem.reason)?;
                }
                Ok(())
            }
        }
    }
}

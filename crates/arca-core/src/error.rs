//! # Error Hierarchy
//!
//! Structured error types shared across the workspace, built with
//! `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Locally recoverable conditions ([`ContentIdError`], [`RevisionError`])
//! are not meant to abort a run. They are collected into a
//! [`SkipReport`](crate::report::SkipReport) and shown to the operator as
//! one batch once processing is done.

use thiserror::Error;

/// Top-level error type for arca's core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArcaError {
    /// A content identifier could not be parsed.
    #[error("content identifier error: {0}")]
    ContentId(#[from] ContentIdError),

    /// A historical revision could not be read or decoded.
    #[error("revision error: {0}")]
    Revision(#[from] RevisionError),
}

/// Errors parsing a content identifier from its external string form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentIdError {
    /// The input was empty or whitespace-only.
    #[error("content identifier is empty")]
    Empty,

    /// The input is not a valid CID.
    #[error("malformed content identifier \"{input}\": {reason}")]
    Malformed {
        /// The string that failed to parse.
        input: String,
        /// Why the parser rejected it.
        reason: String,
    },
}

/// A single historical revision could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    /// The revision's file content could not be read from history.
    #[error("could not read {path} at {revision}: {reason}")]
    Unreadable {
        /// Repository-relative path of the descriptor.
        path: String,
        /// Revision handle the read was attempted at.
        revision: String,
        /// Underlying failure.
        reason: String,
    },

    /// The descriptor has no front-matter block.
    #[error("{path} at {revision} has no front matter")]
    NoFrontMatter {
        /// Repository-relative path of the descriptor.
        path: String,
        /// Revision handle.
        revision: String,
    },

    /// The front matter is not a decodable document.
    #[error("{path} at {revision} could not be decoded: {reason}")]
    Undecodable {
        /// Repository-relative path of the descriptor.
        path: String,
        /// Revision handle.
        revision: String,
        /// Decoder message.
        reason: String,
    },
}

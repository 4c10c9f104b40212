//! Engine error types.
//!
//! [`RemoteError`] is what capability implementations return. The engine
//! wraps it with the stage and destination it occurred in, so a caller can
//! tell a fatal tree failure from a failure confined to one destination.

use arca_core::ContentId;
use thiserror::Error;

use crate::job::Role;

/// A failed call to a remote collaborator.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The remote answered with an unexpected status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response could not be understood.
    #[error("unexpected response from {endpoint}: {message}")]
    Protocol { endpoint: String, message: String },
}

/// Result alias for capability calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Building the directory tree failed. Fatal for the whole run.
#[derive(Debug, Error)]
pub enum TreeBuildError {
    /// A file referenced by an artifact could not be resolved on the node.
    #[error("could not resolve {slug}/{filename} ({id}): {source}")]
    Resolve {
        slug: String,
        filename: String,
        id: ContentId,
        #[source]
        source: RemoteError,
    },

    /// A directory node could not be finalized.
    #[error("could not finalize directory {path:?}: {source}")]
    Finalize {
        path: String,
        #[source]
        source: RemoteError,
    },
}

/// Errors surfaced by the sync pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("directory tree build failed: {0}")]
    TreeBuild(#[from] TreeBuildError),

    /// Listing or confirmation failed. Fatal for that destination only.
    #[error("reconciliation with {destination} failed: {source}")]
    Reconciliation {
        destination: String,
        #[source]
        source: RemoteError,
    },

    /// A pin or upload failed. Earlier mutations in the same run stand.
    #[error("{role} mutation of {id} at {destination} failed: {source}")]
    Mutation {
        destination: String,
        id: ContentId,
        role: Role,
        #[source]
        source: RemoteError,
    },

    #[error("sync cancelled")]
    Cancelled,
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconciliation_error_names_destination() {
        let err = EngineError::Reconciliation {
            destination: "pinning".to_string(),
            source: RemoteError::Status {
                endpoint: "https://pins.example/pins".to_string(),
                status: 500,
                body: "oops".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("pinning"));
        assert!(msg.contains("HTTP 500"));
    }

    #[test]
    fn tree_build_converts_into_engine_error() {
        let err: EngineError = TreeBuildError::Finalize {
            path: "/".to_string(),
            source: RemoteError::Transport {
                endpoint: "http://127.0.0.1:5001".to_string(),
                message: "connection refused".to_string(),
            },
        }
        .into();
        assert!(matches!(err, EngineError::TreeBuild(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}

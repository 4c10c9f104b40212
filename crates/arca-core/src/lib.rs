#![deny(missing_docs)]

//! # arca-core — Foundational Types for arca
//!
//! Every other crate in the workspace builds on the types defined here. It
//! has no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **[`ContentKey`] decides identity.** Content identifiers have many
//!    serializations. Deduplication and presence checks compare the
//!    version-independent key, never identifier strings.
//!
//! 2. **Latest state is derived, not stored.** [`ArtifactLatestState`] is
//!    recomputed each run from the full revision history by
//!    [`resolve::resolve_all`].
//!
//! 3. **Recoverable errors are reported, not raised.** Malformed entries
//!    and unreadable revisions land in a [`SkipReport`] shown once at the
//!    end of a run.

pub mod artifact;
pub mod content;
pub mod dedup;
pub mod error;
pub mod report;
pub mod resolve;

// Re-export primary types at crate root for ergonomic imports.
pub use artifact::{ArtifactLatestState, ArtifactRevision, FileDescriptor, RevisionId};
pub use content::{canonical_key, ContentId, ContentKey, ContentSet};
pub use dedup::{collect, difference};
pub use error::{ArcaError, ContentIdError, RevisionError};
pub use report::{SkipReport, SkippedEntry};
pub use resolve::{resolve_all, resolve_artifact, Resolution};

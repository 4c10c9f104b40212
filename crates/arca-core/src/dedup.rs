//! # Content Deduplicator
//!
//! Produces the unique set of content identifiers referenced by a corpus
//! and computes what a remote is missing. Identity is always decided by
//! [`ContentKey`](crate::ContentKey); the first identifier seen for a key is
//! the one kept, so output order is deterministic.

use crate::artifact::ArtifactLatestState;
use crate::content::{ContentId, ContentSet};

/// Unique content identifiers across all artifacts, in first-seen order.
///
/// Artifacts are visited in the given order and each artifact's files in
/// filename order.
pub fn collect(artifacts: &[ArtifactLatestState]) -> Vec<ContentId> {
    let mut seen = ContentSet::new();
    let mut unique = Vec::new();

    for artifact in artifacts {
        for id in artifact.files().values() {
            if seen.insert_id(id) {
                unique.push(*id);
            }
        }
    }

    tracing::info!(unique = unique.len(), "found unique CIDs in artifact files");
    unique
}

/// Entries of `local` whose content is not in `remote`, in `local` order.
pub fn difference(remote: &ContentSet, local: &[ContentId]) -> Vec<ContentId> {
    local
        .iter()
        .filter(|id| !remote.contains_id(id))
        .copied()
        .collect()
}

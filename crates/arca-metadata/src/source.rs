//! The metadata source seam.

use std::path::{Component, Path, PathBuf};

use arca_core::{ArtifactRevision, SkipReport};
use async_trait::async_trait;
use serde::Serialize;

use crate::entry::ArtifactEntry;
use crate::error::MetadataResult;

/// File extension of artifact descriptors.
pub const DESCRIPTOR_EXTENSION: &str = "md";

/// Something that can produce artifact revisions for a run.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Load every revision this source knows about.
    async fn load(&self) -> MetadataResult<LoadedRevisions>;
}

/// A fully parsed current-schema descriptor, kept for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDocument {
    pub slug: String,
    pub path: String,
    pub entry: ArtifactEntry,
}

/// Output of [`MetadataSource::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadedRevisions {
    pub revisions: Vec<ArtifactRevision>,
    /// Full descriptors. Only the working tree produces these.
    pub documents: Vec<ArtifactDocument>,
    /// Revisions that could not be read or decoded.
    pub skipped: SkipReport,
}

impl LoadedRevisions {
    /// Revision history of one artifact, newest first.
    pub fn history_of(&self, slug: &str) -> Vec<&ArtifactRevision> {
        let mut history: Vec<_> = self
            .revisions
            .iter()
            .filter(|rev| rev.slug() == slug)
            .collect();
        history.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        history
    }
}

/// Slug of a descriptor path: its file stem.
pub(crate) fn slug_of(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// Whether `path` (repository-relative) is a descriptor directly inside
/// `artifacts_dir`.
pub(crate) fn is_descriptor(path: &Path, artifacts_dir: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(DESCRIPTOR_EXTENSION)
        && path.parent().map(normalize) == Some(normalize(artifacts_dir))
}

/// Drop `.` components so `./artifacts` and `artifacts` compare equal.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

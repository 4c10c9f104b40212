//! Working-tree loader (`validate` mode).
//!
//! Reads every descriptor currently checked out, parses it against the
//! current schema and validates it. Any invalid descriptor aborts the load
//! with every problem found across all files.

use std::path::PathBuf;

use arca_core::ArtifactRevision;
use async_trait::async_trait;
use chrono::Utc;

use crate::entry::ArtifactEntry;
use crate::error::{ArtifactProblem, MetadataError, MetadataResult};
use crate::frontmatter;
use crate::source::{
    is_descriptor, slug_of, ArtifactDocument, LoadedRevisions, MetadataSource,
};
use crate::validate::validate_entry;

/// Descriptors as they exist in the working tree.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    repo: PathBuf,
    artifacts_path: PathBuf,
}

impl WorkingTree {
    /// `artifacts_path` is relative to `repo`.
    pub fn new(repo: impl Into<PathBuf>, artifacts_path: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            artifacts_path: artifacts_path.into(),
        }
    }

    async fn descriptor_paths(&self) -> MetadataResult<Vec<PathBuf>> {
        let dir = self.repo.join(&self.artifacts_path);
        if !tokio::fs::try_exists(&dir).await? {
            return Err(MetadataError::DirectoryNotFound { path: dir });
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let relative = self.artifacts_path.join(entry.file_name());
            if entry.file_type().await?.is_file() && is_descriptor(&relative, &self.artifacts_path)
            {
                paths.push(relative);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl MetadataSource for WorkingTree {
    fn name(&self) -> &'static str {
        "tree"
    }

    async fn load(&self) -> MetadataResult<LoadedRevisions> {
        let paths = self.descriptor_paths().await?;
        tracing::info!(count = paths.len(), "found artifact files in the tree");

        let loaded_at = Utc::now();
        let mut problems = Vec::new();
        let mut loaded = LoadedRevisions::default();

        for relative in paths {
            let display = relative.display().to_string();
            let text = tokio::fs::read_to_string(self.repo.join(&relative)).await?;

            let entry = match parse_descriptor(&text) {
                Ok(entry) => entry,
                Err(reason) => {
                    problems.push(ArtifactProblem::Unparseable {
                        path: display,
                        reason,
                    });
                    continue;
                }
            };

            let reasons = validate_entry(&entry);
            if !reasons.is_empty() {
                problems.push(ArtifactProblem::Invalid {
                    path: display,
                    reasons,
                });
                continue;
            }

            let Some(slug) = slug_of(&relative) else {
                continue;
            };
            loaded.revisions.push(ArtifactRevision::new(
                slug.clone(),
                display.clone(),
                None,
                loaded_at,
                entry.descriptors(),
            ));
            loaded.documents.push(ArtifactDocument {
                slug,
                path: display,
                entry,
            });
        }

        if !problems.is_empty() {
            return Err(MetadataError::InvalidArtifacts(problems));
        }

        tracing::info!("all artifact files in the tree are valid");
        Ok(loaded)
    }
}

fn parse_descriptor(text: &str) -> Result<ArtifactEntry, String> {
    let front_matter = frontmatter::extract(text).map_err(|e| e.to_string())?;
    ArtifactEntry::parse(&front_matter).map_err(|e| e.to_string())
}

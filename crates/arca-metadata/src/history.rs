//! Git-history loader (`history` mode).
//!
//! Walks every commit reachable from `HEAD` that added or modified a
//! descriptor and reads each touched descriptor at that commit. Revisions
//! that cannot be read or decoded are recorded in the skip report instead
//! of failing the load; old revisions are decoded through the minimal
//! projection so schema drift does not lose history.

use std::path::{Path, PathBuf};

use arca_core::{ArtifactRevision, RevisionError, RevisionId, SkipReport, SkippedEntry};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::process::Command;

use crate::entry::Projection;
use crate::error::{MetadataError, MetadataResult};
use crate::frontmatter;
use crate::source::{is_descriptor, slug_of, LoadedRevisions, MetadataSource};

const COMMIT_PREFIX: &str = "commit ";

/// Descriptors as recorded in the repository's git history.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo: PathBuf,
    artifacts_path: PathBuf,
}

/// One descriptor path touched by one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Touch {
    pub hash: String,
    pub committed_at: DateTime<Utc>,
    pub path: String,
}

impl GitHistory {
    /// `artifacts_path` is relative to `repo`.
    pub fn new(repo: impl Into<PathBuf>, artifacts_path: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            artifacts_path: artifacts_path.into(),
        }
    }

    async fn git(&self, command: &str, args: &[&str]) -> MetadataResult<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .arg(command)
            .args(args)
            .output()
            .await
            .map_err(|e| MetadataError::Git {
                command: command.to_string(),
                detail: format!("failed to run git: {e}"),
            })?;

        if !output.status.success() {
            return Err(MetadataError::Git {
                command: command.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn touches(&self) -> MetadataResult<Vec<Touch>> {
        let pathspec = self.artifacts_path.to_string_lossy();
        let log = self
            .git(
                "log",
                &[
                    "--format=commit %H %ct",
                    "--name-only",
                    "--diff-filter=d",
                    "--no-renames",
                    "HEAD",
                    "--",
                    &*pathspec,
                ],
            )
            .await?;
        parse_log(&log, &self.artifacts_path)
    }

    async fn read_revision(&self, touch: &Touch) -> Result<Projection, RevisionError> {
        let spec = format!("{}:{}", touch.hash, touch.path);
        let text = self
            .git("show", &[spec.as_str()])
            .await
            .map_err(|e| RevisionError::Unreadable {
                path: touch.path.clone(),
                revision: touch.hash.clone(),
                reason: e.to_string(),
            })?;

        let front_matter =
            frontmatter::extract(&text).map_err(|_| RevisionError::NoFrontMatter {
                path: touch.path.clone(),
                revision: touch.hash.clone(),
            })?;

        Projection::parse(&front_matter).map_err(|e| RevisionError::Undecodable {
            path: touch.path.clone(),
            revision: touch.hash.clone(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl MetadataSource for GitHistory {
    fn name(&self) -> &'static str {
        "history"
    }

    async fn load(&self) -> MetadataResult<LoadedRevisions> {
        let touches = self.touches().await?;
        let mut revisions = Vec::with_capacity(touches.len());
        let mut skipped = SkipReport::new();

        for touch in &touches {
            let Some(slug) = slug_of(Path::new(&touch.path)) else {
                continue;
            };
            match self.read_revision(touch).await {
                Ok(projection) => revisions.push(ArtifactRevision::new(
                    slug,
                    touch.path.clone(),
                    Some(RevisionId::new(touch.hash.clone())),
                    touch.committed_at,
                    projection.files,
                )),
                Err(e) => {
                    tracing::debug!(path = %touch.path, rev = %touch.hash, error = %e, "skipping revision");
                    skipped.record(SkippedEntry {
                        path: touch.path.clone(),
                        revision: Some(RevisionId::new(touch.hash.clone())),
                        file_index: None,
                        error: e.into(),
                    });
                }
            }
        }

        tracing::info!(
            count = revisions.len(),
            skipped = skipped.len(),
            "found artifact files in the history"
        );

        Ok(LoadedRevisions {
            revisions,
            documents: Vec::new(),
            skipped,
        })
    }
}

/// Parse `git log --format="commit %H %ct" --name-only` output.
pub(crate) fn parse_log(log: &str, artifacts_path: &Path) -> MetadataResult<Vec<Touch>> {
    let mut touches = Vec::new();
    let mut current: Option<(String, DateTime<Utc>)> = None;

    for line in log.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix(COMMIT_PREFIX) {
            current = Some(parse_header(header).ok_or_else(|| MetadataError::GitOutput {
                line: line.to_string(),
            })?);
            continue;
        }
        let Some((hash, committed_at)) = &current else {
            return Err(MetadataError::GitOutput {
                line: line.to_string(),
            });
        };
        if is_descriptor(Path::new(line), artifacts_path) {
            touches.push(Touch {
                hash: hash.clone(),
                committed_at: *committed_at,
                path: line.to_string(),
            });
        }
    }

    Ok(touches)
}

fn parse_header(header: &str) -> Option<(String, DateTime<Utc>)> {
    let (hash, secs) = header.split_once(' ')?;
    let secs: i64 = secs.trim().parse().ok()?;
    let committed_at = Utc.timestamp_opt(secs, 0).single()?;
    Some((hash.to_string(), committed_at))
}

//! # Artifact Model
//!
//! An *artifact* is a described unit of archived content, identified by a
//! stable slug and composed of named files. Its descriptor is versioned in
//! a repository; each historical version that touched the descriptor is an
//! [`ArtifactRevision`]. The per-run view of "what the artifact consists of
//! now" is an [`ArtifactLatestState`], resolved from all revisions by
//! [`crate::resolve`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::ContentId;
use crate::error::ContentIdError;

/// An opaque handle to the point in version-control history a revision
/// was read from (a commit hash for git).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    /// Wrap a revision handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The handle as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single file belonging to an artifact revision.
///
/// The content identifier is kept in its external string form. Historical
/// revisions may carry identifiers that no longer parse; those entries are
/// dropped during resolution rather than rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Human-readable name of the file.
    pub name: String,
    /// Declared media type, if any.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Filename the file is published under inside the artifact directory.
    #[serde(default)]
    pub filename: Option<String>,
    /// Content identifier in its external string form.
    pub cid: String,
}

impl FileDescriptor {
    /// Parse this file's content identifier.
    pub fn content_id(&self) -> Result<ContentId, ContentIdError> {
        ContentId::parse(&self.cid)
    }

    /// The publishable filename, if present and not blank.
    pub fn usable_filename(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// One historical version of an artifact's descriptor.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRevision {
    slug: String,
    path: String,
    revision: Option<RevisionId>,
    timestamp: DateTime<Utc>,
    files: Vec<FileDescriptor>,
}

impl ArtifactRevision {
    /// Construct a revision.
    ///
    /// `revision` is `None` for descriptors read from the working tree
    /// rather than from history.
    pub fn new(
        slug: impl Into<String>,
        path: impl Into<String>,
        revision: Option<RevisionId>,
        timestamp: DateTime<Utc>,
        files: Vec<FileDescriptor>,
    ) -> Self {
        Self {
            slug: slug.into(),
            path: path.into(),
            revision,
            timestamp,
            files,
        }
    }

    /// The artifact slug.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Repository-relative path of the descriptor.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The history handle, if read from history.
    pub fn revision(&self) -> Option<&RevisionId> {
        self.revision.as_ref()
    }

    /// When this revision was committed.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The files listed in this revision, in descriptor order.
    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }
}

/// The latest known state of one artifact: filename to content identifier.
///
/// Never contains a blank filename. Recomputed every run and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactLatestState {
    slug: String,
    files: BTreeMap<String, ContentId>,
}

impl ArtifactLatestState {
    /// An artifact with no resolved files yet.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            files: BTreeMap::new(),
        }
    }

    /// Record `id` under `filename` unless the filename is blank or already
    /// assigned. Returns whether the entry was recorded.
    ///
    /// First assignment wins, so callers feeding entries newest-first get
    /// most-recent-wins semantics.
    pub fn assign(&mut self, filename: &str, id: ContentId) -> bool {
        if filename.trim().is_empty() || self.files.contains_key(filename) {
            return false;
        }
        self.files.insert(filename.to_string(), id);
        true
    }

    /// Builder-style [`assign`](Self::assign).
    pub fn with_file(mut self, filename: &str, id: ContentId) -> Self {
        self.assign(filename, id);
        self
    }

    /// The artifact slug.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Resolved files, ordered by filename.
    pub fn files(&self) -> &BTreeMap<String, ContentId> {
        &self.files
    }

    /// The content identifier currently assigned to `filename`.
    pub fn get(&self, filename: &str) -> Option<&ContentId> {
        self.files.get(filename)
    }

    /// Number of resolved files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file resolved for this artifact.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

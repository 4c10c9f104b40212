//! Units of remote mutation and the provenance attached to them.

use std::collections::BTreeMap;
use std::fmt;

use arca_core::ContentId;
use serde::Serialize;

/// Default provenance tag written into pin metadata and pin names.
pub const DEFAULT_PROVENANCE_TAG: &str = "lgbt.acearchive.artifact-action";

/// What a piece of content is to this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A file referenced by an artifact.
    File,
    /// The root directory of the published tree.
    Root,
}

impl Role {
    /// Lowercase name, as written into pin metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Root => "root",
        }
    }

    fn collection(self) -> &'static str {
        match self {
            Self::File => "files",
            Self::Root => "roots",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item to pin or upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Content to pin or upload.
    pub id: ContentId,
    pub role: Role,
}

impl Job {
    /// A file-role job.
    pub fn file(id: ContentId) -> Self {
        Self { id, role: Role::File }
    }

    /// A root-role job.
    pub fn root(id: ContentId) -> Self {
        Self { id, role: Role::Root }
    }
}

/// Identifies content this tool is responsible for at a shared destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    tag: String,
}

impl Provenance {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Metadata attached to a mutation: the bare tag plus `<tag>.kind`.
    pub fn meta(&self, role: Role) -> BTreeMap<String, String> {
        BTreeMap::from([
            (self.tag.clone(), String::new()),
            (format!("{}.kind", self.tag), role.as_str().to_string()),
        ])
    }

    /// Human-readable name for a mutation, e.g. `<tag>/files/<cid>`.
    pub fn name_for(&self, job: &Job) -> String {
        format!("{}/{}/{}", self.tag, job.role.collection(), job.id)
    }
}

impl Default for Provenance {
    fn default() -> Self {
        Self::new(DEFAULT_PROVENANCE_TAG)
    }
}

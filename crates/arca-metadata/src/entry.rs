//! Descriptor decoding.
//!
//! Two views of the same front matter:
//!
//! - [`ArtifactEntry`] is the full, strictly typed current schema. It is
//!   used for the working tree, where every descriptor must be valid now.
//! - [`Projection`] is the minimal view the sync engine needs (schema
//!   version and file list), read defensively from a generic YAML value.
//!   It is used for history, where old revisions may follow older schemas
//!   or carry fields that no longer exist.

use std::fmt;

use arca_core::FileDescriptor;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Schema version the typed [`ArtifactEntry`] describes.
pub const CURRENT_VERSION: i64 = 1;

/// Descriptor schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    /// The current schema.
    V1,
    /// A version this build does not know. Still yields a projection.
    Unknown(i64),
}

impl SchemaVersion {
    /// Map a raw `version` field to a schema version.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            CURRENT_VERSION => Self::V1,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v{CURRENT_VERSION}"),
            Self::Unknown(n) => write!(f, "unknown ({n})"),
        }
    }
}

/// An external link attached to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactLink {
    pub name: String,
    pub url: String,
}

/// A file entry as written in the current schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArtifactFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub cid: String,
}

impl From<&ArtifactFile> for FileDescriptor {
    fn from(file: &ArtifactFile) -> Self {
        FileDescriptor {
            name: file.name.clone(),
            media_type: file.media_type.clone(),
            filename: file.filename.clone(),
            cid: file.cid.clone(),
        }
    }
}

/// A descriptor in the current schema. Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArtifactEntry {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub files: Vec<ArtifactFile>,
    #[serde(default)]
    pub links: Vec<ArtifactLink>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub identities: Vec<String>,
    #[serde(default)]
    pub from_year: i64,
    #[serde(default)]
    pub to_year: Option<i64>,
    #[serde(default)]
    pub decades: Vec<i64>,
}

impl ArtifactEntry {
    /// Parse front-matter YAML strictly.
    pub fn parse(front_matter: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(front_matter)
    }

    /// The declared schema version.
    pub fn schema_version(&self) -> SchemaVersion {
        SchemaVersion::from_raw(self.version)
    }

    /// File list as engine descriptors.
    pub fn descriptors(&self) -> Vec<FileDescriptor> {
        self.files.iter().map(FileDescriptor::from).collect()
    }
}

/// The fields of a descriptor the sync engine needs, from any schema
/// version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub version: SchemaVersion,
    pub files: Vec<FileDescriptor>,
}

impl Projection {
    /// Parse front-matter YAML and project it.
    pub fn parse(front_matter: &str) -> Result<Self, serde_yaml::Error> {
        let value: Value = serde_yaml::from_str(front_matter)?;
        Ok(Self::from_value(&value))
    }

    /// Project a generic document.
    ///
    /// Missing or mistyped fields become absent rather than errors. A
    /// `files` element that is not a mapping is dropped. A missing `cid`
    /// becomes the empty string, which the resolver reports as malformed.
    pub fn from_value(value: &Value) -> Self {
        let version = value
            .get("version")
            .and_then(Value::as_i64)
            .unwrap_or_default();

        let files = value
            .get("files")
            .and_then(Value::as_sequence)
            .map(|seq| seq.iter().filter_map(project_file).collect())
            .unwrap_or_default();

        Self {
            version: SchemaVersion::from_raw(version),
            files,
        }
    }
}

fn project_file(value: &Value) -> Option<FileDescriptor> {
    if !value.is_mapping() {
        return None;
    }
    Some(FileDescriptor {
        name: string_field(value, "name").unwrap_or_default(),
        media_type: string_field(value, "mediaType"),
        filename: string_field(value, "filename"),
        cid: string_field(value, "cid").unwrap_or_default(),
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

//! # Skipped-Entry Report
//!
//! Locally recovered failures (malformed identifiers, unreadable revisions)
//! never abort a run. They are accumulated here and surfaced as a single
//! batch once processing completes, so the operator sees one coherent list
//! of what was skipped and why.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::artifact::RevisionId;
use crate::error::ArcaError;

/// One entry that was dropped during processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Repository-relative path of the descriptor the entry came from.
    pub path: String,
    /// Revision handle, when the entry came from history.
    pub revision: Option<RevisionId>,
    /// Index into the descriptor's `files` list, for file-level skips.
    pub file_index: Option<usize>,
    /// Why the entry was skipped.
    #[serde(serialize_with = "serialize_display")]
    pub error: ArcaError,
}

impl fmt::Display for SkippedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.path)?;
        if let Some(revision) = &self.revision {
            write!(f, " @ {revision}")?;
        }
        if let Some(index) = self.file_index {
            write!(f, " files[{index}]")?;
        }
        write!(f, ": {}", self.error)
    }
}

fn serialize_display<S: Serializer>(value: &ArcaError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Batch of skipped entries, in the order they were encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SkipReport {
    entries: Vec<SkippedEntry>,
}

impl SkipReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped entry.
    pub fn record(&mut self, entry: SkippedEntry) {
        self.entries.push(entry);
    }

    /// Append every entry of `other`.
    pub fn merge(&mut self, other: SkipReport) {
        self.entries.extend(other.entries);
    }

    /// Whether nothing was skipped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of skipped entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The entries in encounter order.
    pub fn entries(&self) -> &[SkippedEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContentIdError, RevisionError};

    fn malformed(path: &str, index: usize) -> SkippedEntry {
        SkippedEntry {
            path: path.to_string(),
            revision: Some(RevisionId::new("abc123")),
            file_index: Some(index),
            error: ContentIdError::Malformed {
                input: "zzz".to_string(),
                reason: "bad multibase".to_string(),
            }
            .into(),
        }
    }

    #[test]
    fn display_includes_location() {
        let line = malformed("artifacts/a.md", 2).to_string();
        assert!(line.starts_with("'artifacts/a.md' @ abc123 files[2]: "));
        assert!(line.contains("zzz"));
    }

    #[test]
    fn merge_preserves_order() {
        let mut first = SkipReport::new();
        first.record(malformed("a.md", 0));
        let mut second = SkipReport::new();
        second.record(malformed("b.md", 1));
        first.merge(second);
        let paths: Vec<_> = first.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "b.md"]);
    }

    #[test]
    fn serializes_error_as_message() {
        let mut report = SkipReport::new();
        report.record(SkippedEntry {
            path: "c.md".to_string(),
            revision: None,
            file_index: None,
            error: RevisionError::NoFrontMatter {
                path: "c.md".to_string(),
                revision: "HEAD".to_string(),
            }
            .into(),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json[0]["path"], "c.md");
        assert!(json[0]["error"].as_str().unwrap().contains("no front matter"));
    }
}

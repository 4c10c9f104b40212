//! # Revision Resolver
//!
//! Turns the full revision history of each artifact into a single
//! [`ArtifactLatestState`].
//!
//! Resolution is a per-filename merge, not a whole-revision override. A
//! commit may touch only some of an artifact's files, and the older entries
//! for the untouched names remain their latest valid record. Revisions are
//! walked newest to oldest and the first content identifier seen for each
//! filename wins.
//!
//! Entries with a blank filename are ignored. Entries whose identifier does
//! not parse are dropped and, if they would otherwise have decided the
//! filename's value, recorded in the [`SkipReport`].

use std::collections::BTreeMap;

use crate::artifact::{ArtifactLatestState, ArtifactRevision};
use crate::report::{SkipReport, SkippedEntry};

/// Latest states for every artifact, plus what was dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One state per slug, ordered by slug. May include artifacts that
    /// resolved to zero files.
    pub artifacts: Vec<ArtifactLatestState>,
    /// Entries dropped during resolution.
    pub skipped: SkipReport,
}

/// Resolve a single artifact from its revisions.
///
/// `revisions` may be in any order; they are visited by descending
/// timestamp. Revisions sharing a timestamp keep their relative input
/// order. Revisions whose slug differs from `slug` are ignored.
pub fn resolve_artifact(
    slug: &str,
    revisions: &[ArtifactRevision],
    skipped: &mut SkipReport,
) -> ArtifactLatestState {
    let mut ordered: Vec<&ArtifactRevision> =
        revisions.iter().filter(|rev| rev.slug() == slug).collect();
    ordered.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));

    let mut state = ArtifactLatestState::new(slug);

    for revision in ordered {
        for (index, file) in revision.files().iter().enumerate() {
            let Some(filename) = file.usable_filename() else {
                continue;
            };
            if state.get(filename).is_some() {
                continue;
            }
            match file.content_id() {
                Ok(id) => {
                    state.assign(filename, id);
                }
                Err(e) => skipped.record(SkippedEntry {
                    path: revision.path().to_string(),
                    revision: revision.revision().cloned(),
                    file_index: Some(index),
                    error: e.into(),
                }),
            }
        }
    }

    state
}

/// Resolve every artifact present in `revisions`.
pub fn resolve_all<I>(revisions: I) -> Resolution
where
    I: IntoIterator<Item = ArtifactRevision>,
{
    let mut by_slug: BTreeMap<String, Vec<ArtifactRevision>> = BTreeMap::new();
    for revision in revisions {
        by_slug
            .entry(revision.slug().to_string())
            .or_default()
            .push(revision);
    }

    let mut resolution = Resolution::default();
    for (slug, history) in &by_slug {
        let state = resolve_artifact(slug, history, &mut resolution.skipped);
        tracing::debug!(
            slug = %slug,
            revisions = history.len(),
            files = state.len(),
            "resolved artifact"
        );
        resolution.artifacts.push(state);
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{FileDescriptor, RevisionId};
    use crate::content::testing::{v0, v1};
    use chrono::{TimeZone, Utc};

    fn file(filename: &str, cid: &str) -> FileDescriptor {
        FileDescriptor {
            name: filename.to_string(),
            media_type: None,
            filename: Some(filename.to_string()),
            cid: cid.to_string(),
        }
    }

    fn revision(slug: &str, secs: i64, files: Vec<FileDescriptor>) -> ArtifactRevision {
        ArtifactRevision::new(
            slug,
            format!("artifacts/{slug}.md"),
            Some(RevisionId::new(format!("rev-{secs}"))),
            Utc.timestamp_opt(secs, 0).unwrap(),
            files,
        )
    }

    #[test]
    fn update_touching_one_file_keeps_the_other() {
        let x = v1(1);
        let y = v1(2);
        let revisions = vec![
            revision("a", 100, vec![file("fileA", &x.to_string())]),
            revision("a", 200, vec![file("fileB", &y.to_string())]),
        ];
        let mut skipped = SkipReport::new();
        let state = resolve_artifact("a", &revisions, &mut skipped);
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("fileA"), Some(&x));
        assert_eq!(state.get("fileB"), Some(&y));
        assert!(skipped.is_empty());
    }

    #[test]
    fn later_timestamp_wins_for_same_filename() {
        let x = v1(1);
        let y = v1(2);
        // Deliberately out of order.
        let revisions = vec![
            revision("a", 200, vec![file("fileA", &y.to_string())]),
            revision("a", 100, vec![file("fileA", &x.to_string())]),
        ];
        let state = resolve_artifact("a", &revisions, &mut SkipReport::new());
        assert_eq!(state.get("fileA"), Some(&y));
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let revisions = vec![
            revision("a", 100, vec![file("f", &v1(1).to_string())]),
            revision("a", 100, vec![file("f", &v1(2).to_string())]),
        ];
        let state = resolve_artifact("a", &revisions, &mut SkipReport::new());
        assert_eq!(state.get("f"), Some(&v1(1)));
    }

    #[test]
    fn blank_filenames_are_dropped_silently() {
        let mut blank = file("ignored", &v1(1).to_string());
        blank.filename = Some("  ".to_string());
        let mut missing = file("ignored", &v1(2).to_string());
        missing.filename = None;
        let revisions = vec![revision("a", 100, vec![blank, missing])];
        let mut skipped = SkipReport::new();
        let state = resolve_artifact("a", &revisions, &mut skipped);
        assert!(state.is_empty());
        assert!(skipped.is_empty());
    }

    #[test]
    fn malformed_newest_entry_falls_back_to_older_valid_one() {
        let x = v0(1);
        let revisions = vec![
            revision("a", 100, vec![file("f", &x.to_string())]),
            revision("a", 200, vec![file("f", "garbage")]),
        ];
        let mut skipped = SkipReport::new();
        let state = resolve_artifact("a", &revisions, &mut skipped);
        assert_eq!(state.get("f"), Some(&x));
        assert_eq!(skipped.len(), 1);
        let entry = &skipped.entries()[0];
        assert_eq!(entry.revision.as_ref().map(RevisionId::as_str), Some("rev-200"));
        assert_eq!(entry.file_index, Some(0));
    }

    #[test]
    fn malformed_entry_shadowed_by_newer_valid_one_is_not_reported() {
        let revisions = vec![
            revision("a", 100, vec![file("f", "garbage")]),
            revision("a", 200, vec![file("f", &v1(1).to_string())]),
        ];
        let mut skipped = SkipReport::new();
        resolve_artifact("a", &revisions, &mut skipped);
        assert!(skipped.is_empty());
    }

    #[test]
    fn corrupt_entry_does_not_affect_siblings() {
        let revisions = vec![revision(
            "a",
            100,
            vec![file("bad", "garbage"), file("good", &v1(3).to_string())],
        )];
        let mut skipped = SkipReport::new();
        let state = resolve_artifact("a", &revisions, &mut skipped);
        assert_eq!(state.len(), 1);
        assert_eq!(state.get("good"), Some(&v1(3)));
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn resolve_all_groups_by_slug_in_order() {
        let revisions = vec![
            revision("zeta", 100, vec![file("z", &v1(1).to_string())]),
            revision("alpha", 100, vec![file("a", &v1(2).to_string())]),
            revision("alpha", 50, vec![]),
        ];
        let resolution = resolve_all(revisions);
        let slugs: Vec<_> = resolution.artifacts.iter().map(|a| a.slug()).collect();
        assert_eq!(slugs, vec!["alpha", "zeta"]);
    }

    #[test]
    fn resolve_all_keeps_artifacts_with_no_files() {
        let revisions = vec![revision("empty", 100, vec![file("f", "garbage")])];
        let resolution = resolve_all(revisions);
        assert_eq!(resolution.artifacts.len(), 1);
        assert!(resolution.artifacts[0].is_empty());
        assert_eq!(resolution.skipped.len(), 1);
    }
}

//! Field-level validation of current-schema descriptors.
//!
//! Every rule is checked and every failure is reported, so an author sees
//! all the problems in a file at once.

use std::collections::BTreeSet;
use std::path::Path;

use arca_core::ContentId;

use crate::entry::{ArtifactEntry, SchemaVersion};
use crate::error::FieldProblem;

/// Check `entry` against the descriptor rules. An empty result means valid.
pub fn validate_entry(entry: &ArtifactEntry) -> Vec<FieldProblem> {
    let mut problems = Vec::new();
    let mut flag = |field: String, reason: &str| {
        problems.push(FieldProblem {
            field,
            reason: reason.to_string(),
        });
    };

    if let SchemaVersion::Unknown(n) = entry.schema_version() {
        flag("version".into(), &format!("is not a supported schema version ({n})"));
    }
    if entry.title.is_empty() {
        flag("title".into(), "can not be empty");
    }
    if entry.description.is_empty() {
        flag("description".into(), "can not be empty");
    }
    if entry.from_year == 0 {
        flag("fromYear".into(), "can not be 0");
    }
    if let Some(to_year) = entry.to_year {
        if to_year == 0 {
            flag("toYear".into(), "can not be 0");
        } else if to_year < entry.from_year {
            flag("toYear".into(), "can not come before `fromYear`");
        }
    }

    check_decades(entry, &mut flag);

    if entry.files.is_empty() {
        flag("files".into(), "can not be empty");
    }
    for (index, file) in entry.files.iter().enumerate() {
        if file.name.is_empty() {
            flag(format!("files[{index}].name"), "can not be empty");
        }
        if ContentId::parse(&file.cid).is_err() {
            flag(format!("files[{index}].cid"), "is not a valid CID");
        }
        if let Some(media_type) = &file.media_type {
            if !is_media_type(media_type) {
                flag(format!("files[{index}].mediaType"), "is not a valid media type");
            }
        }
        if let Some(filename) = &file.filename {
            if Path::new(filename).extension().is_none() {
                flag(
                    format!("files[{index}].filename"),
                    "does not have a file extension",
                );
            }
        }
    }

    problems
}

fn decade_of(year: i64) -> i64 {
    year - year.rem_euclid(10)
}

fn check_decades(entry: &ArtifactEntry, flag: &mut impl FnMut(String, &str)) {
    if entry.decades.is_empty() {
        flag("decades".into(), "can not be empty");
    }

    let years_known = entry.from_year != 0 && entry.to_year != Some(0);
    let earliest = decade_of(entry.from_year);
    let latest = decade_of(entry.to_year.unwrap_or(entry.from_year));
    let mut expected: BTreeSet<i64> = (earliest..=latest).step_by(10).collect();
    let mut seen = BTreeSet::new();

    for (index, &decade) in entry.decades.iter().enumerate() {
        let field = format!("decades[{index}]");
        if decade.rem_euclid(10) != 0 {
            flag(field, "is not a decade");
            continue;
        }
        if !years_known {
            continue;
        }
        if decade < earliest {
            flag(field, "comes before the decade of `fromYear`");
        } else if decade > latest {
            flag(field, "comes after the decade of `toYear`");
        } else if !seen.insert(decade) {
            flag(field, "is in the list more than once");
        } else {
            expected.remove(&decade);
        }
    }

    if years_known {
        for missing in expected {
            flag("decades".into(), &format!("should contain '{missing}' but doesn't"));
        }
    }
}

/// Syntactic media type check: `type/subtype` followed by optional
/// `; name=value` parameters, where value may be a quoted string.
fn is_media_type(input: &str) -> bool {
    let mut parts = input.split(';');
    let Some(essence) = parts.next() else {
        return false;
    };
    let Some((kind, subtype)) = essence.trim().split_once('/') else {
        return false;
    };
    if !is_token(kind) || !is_token(subtype) {
        return false;
    }
    parts.all(|param| {
        let param = param.trim();
        match param.split_once('=') {
            Some((name, value)) => is_token(name) && (is_token(value) || is_quoted(value)),
            // Tolerate a trailing `;`.
            None => param.is_empty(),
        }
    })
}

fn is_token(s: &str) -> bool {
    const SPECIALS: &str = "()<>@,;:\\\"/[]?=";
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_graphic() && !SPECIALS.contains(c))
}

fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

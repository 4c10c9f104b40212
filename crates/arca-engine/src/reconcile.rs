//! # Remote Reconciler
//!
//! Decides which local content a destination does not yet hold, in two
//! phases:
//!
//! 1. **Sweep.** Page through the destination's present-state listing from
//!    now backwards, collecting content keys. Listing pagination at these
//!    services is unreliable, so the sweep is best effort: it stops on a
//!    short page, or when the cursor fails to move strictly backwards.
//! 2. **Confirm.** Every job the sweep did not cover is queried
//!    individually, scoped to this tool's provenance. Only candidates the
//!    destination positively confirms are dropped.
//!
//! The result is a superset of what truly needs mutation. A transport or
//! protocol failure in either phase fails the whole reconciliation; partial
//! sweep results are never used.

use arca_core::{difference, ContentId, ContentSet};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RemoteResult;
use crate::job::{Job, Provenance};
use crate::traits::Destination;

/// Outcome of reconciling one destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Distinct content keys the sweep saw.
    pub swept: usize,
    /// Jobs the sweep did not cover.
    pub candidates: Vec<Job>,
    /// Candidates the per-item query confirmed present.
    pub confirmed: Vec<Job>,
    /// Jobs that must be mutated, in input order.
    pub pending: Vec<Job>,
}

/// Phase 1: collect the keys of everything listed as present.
pub async fn sweep(
    destination: &dyn Destination,
    start: DateTime<Utc>,
) -> RemoteResult<ContentSet> {
    let limit = destination.page_size().max(1);
    let mut present = ContentSet::new();
    let mut cursor = start;
    let mut pages = 0usize;

    loop {
        let page = destination.list_present(cursor, limit).await?;
        pages += 1;

        let mut oldest = cursor;
        for entry in &page {
            match ContentId::parse(&entry.cid) {
                Ok(id) => {
                    present.insert_id(&id);
                }
                Err(e) => tracing::warn!(
                    destination = destination.name(),
                    error = %e,
                    "ignoring unparseable listing entry"
                ),
            }
            oldest = oldest.min(entry.created);
        }

        if page.len() < limit {
            break;
        }
        if oldest >= cursor {
            tracing::warn!(
                destination = destination.name(),
                cursor = %cursor,
                "listing cursor did not move backwards; ending sweep"
            );
            break;
        }
        cursor = oldest;
    }

    tracing::info!(
        destination = destination.name(),
        present = present.len(),
        pages,
        "swept existing content"
    );
    Ok(present)
}

/// Phase 2 input: jobs whose content the sweep did not see, in job order.
pub fn gaps(swept: &ContentSet, jobs: &[Job]) -> Vec<Job> {
    let local: Vec<ContentId> = jobs.iter().map(|job| job.id).collect();
    let missing: ContentSet = difference(swept, &local).iter().collect();
    jobs.iter()
        .filter(|job| missing.contains_id(&job.id))
        .copied()
        .collect()
}

/// Run both phases for `jobs` against `destination`.
pub async fn reconcile(
    destination: &dyn Destination,
    jobs: &[Job],
    provenance: &Provenance,
    start: DateTime<Utc>,
) -> RemoteResult<Reconciliation> {
    let swept = sweep(destination, start).await?;
    let candidates = gaps(&swept, jobs);

    tracing::info!(
        destination = destination.name(),
        skipped = jobs.len() - candidates.len(),
        candidates = candidates.len(),
        "skipping content already present"
    );

    let mut confirmed = Vec::new();
    let mut pending = Vec::new();
    for job in &candidates {
        if destination.confirm(&job.id, job.role, provenance).await? {
            tracing::debug!(destination = destination.name(), cid = %job.id, role = %job.role, "confirmed present");
            confirmed.push(*job);
        } else {
            pending.push(*job);
        }
    }

    Ok(Reconciliation {
        swept: swept.len(),
        candidates,
        confirmed,
        pending,
    })
}

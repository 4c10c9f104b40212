//! # Mutation Executor
//!
//! Submits reconciled jobs to a destination. File-role jobs go first and
//! the root last, so a root is never recorded as present before the
//! content it links to has been submitted. In dry-run mode nothing is
//! submitted; the jobs that would have been are returned instead.

use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::job::{Job, Provenance, Role};
use crate::traits::Destination;

/// What the executor did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Execution {
    /// Jobs submitted, in submission order.
    pub mutated: Vec<Job>,
    /// Jobs that would have been submitted under dry-run.
    pub would_mutate: Vec<Job>,
}

/// Files first, then the root, preserving relative order within each role.
pub fn submission_order(jobs: &[Job]) -> Vec<Job> {
    let (files, roots): (Vec<Job>, Vec<Job>) =
        jobs.iter().partition(|job| job.role == Role::File);
    files.into_iter().chain(roots).collect()
}

/// Submit `jobs` to `destination`.
///
/// Stops at the first failure. Jobs already submitted stay submitted.
pub async fn execute(
    destination: &dyn Destination,
    jobs: &[Job],
    provenance: &Provenance,
    dry_run: bool,
) -> EngineResult<Execution> {
    let ordered = submission_order(jobs);
    let mut execution = Execution::default();

    let total = ordered.len();
    for (index, job) in ordered.into_iter().enumerate() {
        tracing::info!(
            destination = destination.name(),
            role = %job.role,
            dry_run,
            "submitting ({}/{}): {}",
            index + 1,
            total,
            job.id
        );
        if dry_run {
            execution.would_mutate.push(job);
            continue;
        }
        destination
            .submit(&job, provenance)
            .await
            .map_err(|source| EngineError::Mutation {
                destination: destination.name().to_string(),
                id: job.id,
                role: job.role,
                source,
            })?;
        execution.mutated.push(job);
    }

    Ok(execution)
}

//! # Sync Pipeline
//!
//! One run: resolve revisions, collect unique content, build the directory
//! tree, then reconcile and mutate each destination. Destinations run
//! concurrently and fail independently. A tree build failure or
//! cancellation ends the whole run.

use std::future::Future;
use std::sync::Arc;

use arca_core::{collect, resolve_all, ArtifactRevision, ContentId, Resolution};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{EngineError, EngineResult};
use crate::execute::{execute, Execution};
use crate::job::{Job, Provenance};
use crate::reconcile::{reconcile, Reconciliation};
use crate::traits::{Destination, NodeService};
use crate::tree::{build_tree, DirectoryTree};

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Run every read, skip every mutation.
    pub dry_run: bool,
    pub provenance: Provenance,
}

/// Summary of one destination's synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub destination: String,
    /// Unique local files plus the root.
    pub local: usize,
    pub swept_present: usize,
    pub gap_candidates: usize,
    pub confirmed_present: usize,
    /// Jobs handed to the executor. Identical for live and dry runs; the
    /// submissions actually issued are in `execution`.
    pub pending: usize,
    pub dry_run: bool,
    pub root: ContentId,
    #[serde(skip)]
    pub reconciliation: Reconciliation,
    #[serde(skip)]
    pub execution: Execution,
}

/// How one destination fared.
#[derive(Debug)]
pub struct DestinationOutcome {
    pub destination: String,
    pub result: EngineResult<SyncSummary>,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct SyncReport {
    pub resolution: Resolution,
    pub unique: Vec<ContentId>,
    pub tree: DirectoryTree,
    pub destinations: Vec<DestinationOutcome>,
}

impl SyncReport {
    /// Whether every destination synchronized.
    pub fn is_success(&self) -> bool {
        self.destinations.iter().all(|d| d.result.is_ok())
    }
}

/// Drives a run against a node service and any number of destinations.
pub struct SyncPipeline {
    node: Arc<dyn NodeService>,
    destinations: Vec<Arc<dyn Destination>>,
    options: SyncOptions,
    cancel: CancellationToken,
}

impl SyncPipeline {
    pub fn new(node: Arc<dyn NodeService>, options: SyncOptions, cancel: CancellationToken) -> Self {
        Self {
            node,
            destinations: Vec::new(),
            options,
            cancel,
        }
    }

    pub fn with_destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Race `fut` against cancellation.
    async fn guarded<T>(&self, fut: impl Future<Output = T>) -> EngineResult<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
            value = fut => Ok(value),
        }
    }

    /// Run the whole pipeline over `revisions`.
    pub async fn run(&self, revisions: Vec<ArtifactRevision>) -> EngineResult<SyncReport> {
        let resolution = resolve_all(revisions);
        let unique = collect(&resolution.artifacts);

        let tree = self
            .guarded(build_tree(self.node.as_ref(), &resolution.artifacts))
            .await??;

        let mut jobs: Vec<Job> = unique.iter().copied().map(Job::file).collect();
        jobs.push(Job::root(tree.root_id()));

        let outcomes = join_all(
            self.destinations
                .iter()
                .map(|destination| self.sync_destination(destination.as_ref(), &jobs, tree.root_id())),
        )
        .await;

        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        Ok(SyncReport {
            resolution,
            unique,
            tree,
            destinations: outcomes,
        })
    }

    async fn sync_destination(
        &self,
        destination: &dyn Destination,
        jobs: &[Job],
        root: ContentId,
    ) -> DestinationOutcome {
        let name = destination.name().to_string();
        let result = self
            .reconcile_and_execute(destination, jobs, root)
            .instrument(tracing::info_span!("destination", destination = %name))
            .await;
        match &result {
            Ok(summary) => tracing::info!(
                destination = %name,
                swept = summary.swept_present,
                candidates = summary.gap_candidates,
                confirmed = summary.confirmed_present,
                pending = summary.pending,
                submitted = summary.execution.mutated.len(),
                dry_run = summary.dry_run,
                "destination synchronized"
            ),
            Err(e) => tracing::error!(destination = %name, error = %e, "destination failed"),
        }

        DestinationOutcome {
            destination: name,
            result,
        }
    }

    async fn reconcile_and_execute(
        &self,
        destination: &dyn Destination,
        jobs: &[Job],
        root: ContentId,
    ) -> EngineResult<SyncSummary> {
        let reconciliation = self
            .guarded(reconcile(destination, jobs, &self.options.provenance, Utc::now()))
            .await?
            .map_err(|source| EngineError::Reconciliation {
                destination: destination.name().to_string(),
                source,
            })?;

        let execution = self
            .guarded(execute(
                destination,
                &reconciliation.pending,
                &self.options.provenance,
                self.options.dry_run,
            ))
            .await??;

        Ok(SyncSummary {
            destination: destination.name().to_string(),
            local: jobs.len(),
            swept_present: reconciliation.swept,
            gap_candidates: reconciliation.candidates.len(),
            confirmed_present: reconciliation.confirmed.len(),
            pending: reconciliation.pending.len(),
            dry_run: self.options.dry_run,
            root,
            reconciliation,
            execution,
        })
    }
}

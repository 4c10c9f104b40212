//! # Run
//!
//! Load metadata, resolve it, print what was requested, and synchronize
//! every configured destination. Without destinations the run stops after
//! resolution and no remote is contacted.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;

use arca_core::{collect, resolve_all};
use arca_engine::{SyncPipeline, SyncReport};
use arca_metadata::{LoadedRevisions, MetadataError};

use crate::config::RunArgs;
use crate::output::{Reporter, RunOutput};

/// Execute one run. Returns the process exit code.
pub async fn run(args: &RunArgs, reporter: &Reporter, cancel: CancellationToken) -> Result<u8> {
    let options = args.sync_options()?;
    let source = args.source();

    let loaded = tokio::select! {
        biased;
        _ = cancel.cancelled() => bail!("cancelled while loading artifact metadata"),
        loaded = source.load() => loaded,
    };
    let LoadedRevisions {
        revisions,
        documents,
        mut skipped,
    } = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            if let MetadataError::InvalidArtifacts(problems) = &e {
                reporter.report_problems(problems);
            }
            return Err(e).with_context(|| {
                format!(
                    "failed to load artifacts from {} ({})",
                    args.repo.join(&args.path).display(),
                    source.name()
                )
            });
        }
    };
    tracing::info!(
        source = source.name(),
        revisions = revisions.len(),
        "loaded artifact metadata"
    );

    if !args.has_destinations() {
        let mut resolution = resolve_all(revisions);
        let unique = collect(&resolution.artifacts);
        skipped.merge(std::mem::take(&mut resolution.skipped));
        reporter.report_skipped(&skipped);
        reporter.emit(&RunOutput::new(&resolution, documents, unique, Vec::new()))?;
        return Ok(0);
    }

    let (ipfs, destinations) = args.clients()?;
    let pipeline = destinations.into_iter().fold(
        SyncPipeline::new(Arc::new(ipfs), options, cancel),
        SyncPipeline::with_destination,
    );

    let report = match pipeline.run(revisions).await {
        Ok(report) => report,
        Err(e) => {
            reporter.report_skipped(&skipped);
            return Err(e).context("synchronization aborted");
        }
    };
    let SyncReport {
        mut resolution,
        unique,
        tree,
        destinations,
    } = report;
    skipped.merge(std::mem::take(&mut resolution.skipped));
    reporter.report_skipped(&skipped);
    tracing::info!(root = %tree.root_id(), artifacts = tree.artifacts.len(), "built directory tree");

    let mut summaries = Vec::new();
    let mut failed = 0usize;
    for outcome in destinations {
        match outcome.result {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                failed += 1;
                if reporter.is_action() {
                    reporter.error(&format!("{}: {e}", outcome.destination));
                }
            }
        }
    }

    reporter.emit(&RunOutput::new(&resolution, documents, unique, summaries))?;

    if failed > 0 {
        tracing::error!(failed, "one or more destinations failed to synchronize");
        return Ok(1);
    }
    Ok(0)
}

//! Capability interfaces the engine drives.
//!
//! Implementations live in `arca-client`; tests use in-memory fakes. Every
//! trait is object-safe so the pipeline can hold `Arc<dyn …>` handles.

use arca_core::ContentId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RemoteResult;
use crate::job::{Job, Provenance, Role};

/// An existing node on the content-addressed node service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    /// Identifier the node service reports for the node.
    pub id: ContentId,
    /// Cumulative size of the node and everything it links to.
    pub size: u64,
}

/// A named link from a directory node to an existing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLink {
    /// Entry name inside the directory.
    pub name: String,
    /// The linked node.
    pub target: NodeStat,
}

/// Access to the node service that holds file content and stores new
/// directory nodes.
#[async_trait]
pub trait NodeService: Send + Sync {
    /// Look up an existing node without fetching its bytes.
    async fn stat(&self, id: &ContentId) -> RemoteResult<NodeStat>;

    /// Store a directory node with exactly `links` and return it.
    async fn put_directory(&self, links: &[NodeLink]) -> RemoteResult<NodeStat>;
}

/// One entry of a destination's "already present" listing.
///
/// The identifier is left unparsed; the reconciler decides what to do with
/// entries it cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub cid: String,
    /// When the destination recorded the entry; the listing cursor.
    pub created: DateTime<Utc>,
}

/// A remote store content is synchronized to.
///
/// Both the pinning-style service and the archival upload service fit this
/// shape: a newest-first listing paged by a `before` cursor, a targeted
/// existence query, and an idempotent mutation.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Entries requested per listing page.
    fn page_size(&self) -> usize;

    /// Up to `limit` entries in a present state created strictly before
    /// `before`, newest first.
    async fn list_present(
        &self,
        before: DateTime<Utc>,
        limit: usize,
    ) -> RemoteResult<Vec<RemoteEntry>>;

    /// Whether `id` is present *and* attributable to `provenance` in the
    /// given role.
    async fn confirm(
        &self,
        id: &ContentId,
        role: Role,
        provenance: &Provenance,
    ) -> RemoteResult<bool>;

    /// Pin or upload `job`, tagged with `provenance`. Must be idempotent.
    async fn submit(&self, job: &Job, provenance: &Provenance) -> RemoteResult<()>;
}

//! # arca-engine
//!
//! The content synchronization engine. Given artifact revisions, it
//! resolves each artifact's latest files, publishes them under a single
//! content-addressed directory tree, and brings every configured
//! destination up to date:
//!
//! ```text
//! revisions ─► resolve ─► collect ─► build tree ─┬─► reconcile ─► execute   (destination A)
//!                                                 └─► reconcile ─► execute   (destination B)
//! ```
//!
//! Remote collaborators are reached only through the traits in [`traits`].

pub mod error;
pub mod execute;
pub mod job;
pub mod pipeline;
pub mod reconcile;
pub mod traits;
pub mod tree;

pub use error::{EngineError, EngineResult, RemoteError, RemoteResult, TreeBuildError};
pub use execute::{execute, submission_order, Execution};
pub use job::{Job, Provenance, Role, DEFAULT_PROVENANCE_TAG};
pub use pipeline::{DestinationOutcome, SyncOptions, SyncPipeline, SyncReport, SyncSummary};
pub use reconcile::{gaps, reconcile, sweep, Reconciliation};
pub use traits::{Destination, NodeLink, NodeService, NodeStat, RemoteEntry};
pub use tree::{build_tree, DirectoryTree};

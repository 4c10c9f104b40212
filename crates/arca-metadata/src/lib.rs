//! # arca-metadata
//!
//! Where artifact revisions come from. Descriptors are markdown files with
//! YAML front matter, one per artifact, named `<slug>.md` in a single
//! directory of the repository.
//!
//! Two [`MetadataSource`]s are provided:
//!
//! - [`WorkingTree`] reads the checked-out descriptors, validates every
//!   field, and fails with an aggregated report if any file is invalid.
//! - [`GitHistory`] reads every historical revision of every descriptor
//!   reachable from `HEAD`, skipping (and reporting) revisions that cannot
//!   be read.

pub mod entry;
pub mod error;
pub mod frontmatter;
pub mod history;
pub mod source;
pub mod tree;
pub mod validate;

pub use entry::{ArtifactEntry, ArtifactFile, ArtifactLink, Projection, SchemaVersion};
pub use error::{ArtifactProblem, FieldProblem, MetadataError, MetadataResult};
pub use history::GitHistory;
pub use source::{ArtifactDocument, LoadedRevisions, MetadataSource};
pub use tree::WorkingTree;
pub use validate::validate_entry;

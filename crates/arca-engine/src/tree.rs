//! # Directory Tree Builder
//!
//! Publishes every artifact's latest files under one content-addressed
//! root:
//!
//! ```text
//! <root>/<slug>/<filename>
//! ```
//!
//! Only directory nodes are created. File nodes are looked up on the node
//! service by identifier and linked, never fetched or re-hashed. Artifacts
//! with no resolved files are left out. Any failure aborts the whole
//! build; a partial root is never returned.

use std::collections::BTreeMap;

use arca_core::{ArtifactLatestState, ContentId};

use crate::error::TreeBuildError;
use crate::traits::{NodeLink, NodeService, NodeStat};

/// A finalized two-level tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTree {
    pub root: NodeStat,
    /// Artifact directory nodes by slug.
    pub artifacts: BTreeMap<String, NodeStat>,
}

impl DirectoryTree {
    pub fn root_id(&self) -> ContentId {
        self.root.id
    }
}

/// A directory node under construction.
#[derive(Debug, Default)]
struct PendingDirectory {
    children: BTreeMap<String, NodeStat>,
}

impl PendingDirectory {
    fn link(&mut self, name: &str, target: NodeStat) {
        self.children.insert(name.to_string(), target);
    }

    async fn finalize(
        self,
        node: &dyn NodeService,
        path: &str,
    ) -> Result<NodeStat, TreeBuildError> {
        let links: Vec<NodeLink> = self
            .children
            .into_iter()
            .map(|(name, target)| NodeLink { name, target })
            .collect();
        node.put_directory(&links)
            .await
            .map_err(|source| TreeBuildError::Finalize {
                path: path.to_string(),
                source,
            })
    }
}

/// Build the tree for `artifacts` on `node`.
pub async fn build_tree(
    node: &dyn NodeService,
    artifacts: &[ArtifactLatestState],
) -> Result<DirectoryTree, TreeBuildError> {
    let mut root = PendingDirectory::default();
    let mut built = BTreeMap::new();

    for artifact in artifacts.iter().filter(|a| !a.is_empty()) {
        let slug = artifact.slug();
        let mut dir = PendingDirectory::default();

        for (filename, id) in artifact.files() {
            let target = node
                .stat(id)
                .await
                .map_err(|source| TreeBuildError::Resolve {
                    slug: slug.to_string(),
                    filename: filename.clone(),
                    id: *id,
                    source,
                })?;
            dir.link(filename, target);
        }

        let stat = dir.finalize(node, &format!("/{slug}")).await?;
        tracing::debug!(slug, cid = %stat.id, files = artifact.len(), "built artifact directory");
        root.link(slug, stat);
        built.insert(slug.to_string(), stat);
    }

    let root = root.finalize(node, "/").await?;
    tracing::info!(cid = %root.id, artifacts = built.len(), "built root directory");

    Ok(DirectoryTree {
        root,
        artifacts: built,
    })
}

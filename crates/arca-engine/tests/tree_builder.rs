mod common;

use arca_core::ArtifactLatestState;
use arca_engine::{build_tree, TreeBuildError};
use common::{file_id, FakeNode};

#[tokio::test]
async fn artifacts_without_files_are_omitted() {
    let x = file_id(1);
    let node = FakeNode::with_files(&[x]);
    let artifacts = vec![
        ArtifactLatestState::new("a").with_file("f1", x),
        ArtifactLatestState::new("b"),
    ];

    let tree = build_tree(&node, &artifacts).await.unwrap();

    assert_eq!(tree.artifacts.keys().collect::<Vec<_>>(), vec!["a"]);
    let directories = node.directories();
    let (root_id, root_links) = directories.last().unwrap();
    assert_eq!(*root_id, tree.root_id());
    assert_eq!(root_links.len(), 1);
    assert_eq!(root_links[0].name, "a");
    assert_eq!(root_links[0].target, tree.artifacts["a"]);
}

#[tokio::test]
async fn tree_is_two_levels_and_links_existing_files() {
    let (x, y, z) = (file_id(1), file_id(2), file_id(3));
    let node = FakeNode::with_files(&[x, y, z]);
    let artifacts = vec![
        ArtifactLatestState::new("flyer").with_file("front.jpg", x),
        ArtifactLatestState::new("zine")
            .with_file("cover.png", y)
            .with_file("pages.pdf", z),
    ];

    let tree = build_tree(&node, &artifacts).await.unwrap();

    let directories = node.directories();
    assert_eq!(directories.len(), 3, "one node per artifact plus the root");

    let (zine_id, zine_links) = &directories[1];
    assert_eq!(*zine_id, tree.artifacts["zine"].id);
    let names: Vec<_> = zine_links.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["cover.png", "pages.pdf"]);
    assert_eq!(zine_links[0].target.id, y);

    // File links point at the files themselves, never at new nodes.
    for (_, links) in &directories[..2] {
        assert!(links.iter().all(|l| [x, y, z].contains(&l.target.id)));
    }
}

#[tokio::test]
async fn empty_corpus_still_yields_a_root() {
    let node = FakeNode::with_files(&[]);
    let tree = build_tree(&node, &[]).await.unwrap();
    assert!(tree.artifacts.is_empty());
    assert_eq!(node.directories().len(), 1);
}

#[tokio::test]
async fn unresolvable_file_aborts_the_build() {
    let node = FakeNode::with_files(&[file_id(1)]);
    let artifacts = vec![ArtifactLatestState::new("a")
        .with_file("ok.txt", file_id(1))
        .with_file("gone.txt", file_id(9))];

    let err = build_tree(&node, &artifacts).await.unwrap_err();

    match err {
        TreeBuildError::Resolve { slug, filename, .. } => {
            assert_eq!(slug, "a");
            assert_eq!(filename, "gone.txt");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(node.directories().is_empty(), "no partial tree is stored");
}

#[tokio::test]
async fn finalize_failure_aborts_the_build() {
    let node = FakeNode::with_files(&[file_id(1)]).failing_put();
    let artifacts = vec![ArtifactLatestState::new("a").with_file("f", file_id(1))];
    let err = build_tree(&node, &artifacts).await.unwrap_err();
    assert!(matches!(err, TreeBuildError::Finalize { ref path, .. } if path == "/a"));
}

mod common;

use arca_core::ContentSet;
use arca_engine::{gaps, reconcile, sweep, Job, Provenance, RemoteEntry, RemoteError, Role};
use chrono::Utc;
use common::{at, file_id, file_id_v0, Call, FakeDestination};

#[tokio::test]
async fn gap_is_confirmed_present_and_dropped() {
    let (k1, k2, k3) = (file_id(1), file_id(2), file_id(3));
    let destination = FakeDestination::new("pins", 10)
        .listing(&[k1, k2])
        .confirming(&[k3]);
    let jobs = vec![Job::file(k1), Job::file(k2), Job::file(k3)];

    let outcome = reconcile(&destination, &jobs, &Provenance::default(), Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome.swept, 2);
    assert_eq!(outcome.candidates, vec![Job::file(k3)]);
    assert_eq!(outcome.confirmed, vec![Job::file(k3)]);
    assert!(outcome.pending.is_empty());
}

#[tokio::test]
async fn gap_confirmed_absent_must_be_mutated() {
    let (k1, k2, k3) = (file_id(1), file_id(2), file_id(3));
    let destination = FakeDestination::new("pins", 10).listing(&[k1, k2]);
    let jobs = vec![Job::file(k1), Job::file(k2), Job::file(k3)];

    let outcome = reconcile(&destination, &jobs, &Provenance::default(), Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome.candidates, vec![Job::file(k3)]);
    assert_eq!(outcome.pending, vec![Job::file(k3)]);
    // Short first page ends the sweep; only the gap is confirmed.
    assert_eq!(destination.list_calls(), 1);
    let confirms: Vec<_> = destination
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Confirm { .. }))
        .collect();
    assert_eq!(
        confirms,
        vec![Call::Confirm {
            id: k3,
            role: Role::File,
            tag: Provenance::default().tag().to_string(),
        }]
    );
}

#[tokio::test]
async fn sweep_pages_backwards_until_a_short_page() {
    let ids: Vec<_> = (1..=5).map(file_id).collect();
    let destination = FakeDestination::new("uploads", 2).listing(&ids);

    let present = sweep(&destination, Utc::now()).await.unwrap();

    assert_eq!(present.len(), 5);
    assert_eq!(destination.list_calls(), 3);
    let cursors: Vec<_> = destination
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::List { before } => Some(before),
            _ => None,
        })
        .collect();
    assert!(cursors.windows(2).all(|w| w[1] < w[0]));
}

#[tokio::test]
async fn sweep_stops_when_the_cursor_does_not_move() {
    let ids: Vec<_> = (1..=5).map(file_id).collect();
    let destination = FakeDestination::new("uploads", 2)
        .listing(&ids)
        .ignoring_cursor();

    let present = sweep(&destination, Utc::now()).await.unwrap();

    assert_eq!(destination.list_calls(), 2);
    assert_eq!(present.len(), 2);
}

#[tokio::test]
async fn sweep_matches_across_serializations() {
    let destination = FakeDestination::new("pins", 10).listing(&[file_id_v0(7)]);
    let swept = sweep(&destination, Utc::now()).await.unwrap();
    assert!(swept.contains_id(&file_id(7)));
    assert!(gaps(&swept, &[Job::file(file_id(7))]).is_empty());
}

#[tokio::test]
async fn unparseable_listing_entries_are_not_counted_as_present() {
    let destination = FakeDestination::new("pins", 10).raw_listing(vec![
        RemoteEntry {
            cid: "not-a-cid".to_string(),
            created: at(2),
        },
        RemoteEntry {
            cid: file_id(1).to_string(),
            created: at(1),
        },
    ]);
    let swept = sweep(&destination, Utc::now()).await.unwrap();
    assert_eq!(swept.len(), 1);
}

#[tokio::test]
async fn listing_failure_fails_reconciliation() {
    let destination = FakeDestination::new("pins", 10).failing_list();
    let err = reconcile(
        &destination,
        &[Job::file(file_id(1))],
        &Provenance::default(),
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RemoteError::Transport { .. }));
    assert!(destination
        .calls()
        .iter()
        .all(|c| matches!(c, Call::List { .. })));
}

#[test]
fn gaps_keep_job_order_and_roles() {
    let swept: ContentSet = [file_id(2)].iter().collect();
    let jobs = vec![
        Job::file(file_id(3)),
        Job::file(file_id(2)),
        Job::file(file_id(1)),
        Job::root(file_id(9)),
    ];
    assert_eq!(
        gaps(&swept, &jobs),
        vec![
            Job::file(file_id(3)),
            Job::file(file_id(1)),
            Job::root(file_id(9))
        ]
    );
}

// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Two clients exchanging changes and undoing their own work.
use local_undo::{
    EditSession,
    model::{DocChange, DocumentGraph, Item, NodeId, NodeKind},
};
use tracing_subscriber::EnvFilter;

/// Honours `RUST_LOG`, for following a failing exchange.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client(id: &str) -> (EditSession<DocChange>, NodeId) {
    let mut doc = DocumentGraph::new();
    let run = doc.text_run("ABC");
    (EditSession::new(id, doc), run)
}

/// Moves everything `from` has queued over to `to`.
fn deliver(from: &mut EditSession<DocChange>, to: &mut EditSession<DocChange>) -> usize {
    let changes = from.take_outgoing();
    let count = changes.len();
    for change in changes {
        to.receive_remote(change);
    }
    count
}

#[test]
fn undoes_interleave_and_converge() {
    init_logging();
    let (mut alice, run) = client("alice");
    let (mut bob, _) = client("bob");

    alice.edit(vec![DocChange::insert(run, 0, Item::Text('X'))]);
    assert_eq!(deliver(&mut alice, &mut bob), 1);
    bob.edit(vec![DocChange::insert(run, 4, Item::Text('Y'))]);
    deliver(&mut bob, &mut alice);
    assert_eq!(alice.document().text(run), "XABCY");
    assert_eq!(bob.document().text(run), "XABCY");

    assert_eq!(alice.undo_own(), 1);
    assert_eq!(alice.document().text(run), "ABCY");
    deliver(&mut alice, &mut bob);
    assert_eq!(bob.document().text(run), "ABCY");
    // the inverse arrives as an ordinary change on bob's side
    assert!(bob.log().all_changes().iter().all(|change| !change.reverted));

    assert_eq!(bob.undo_own(), 1);
    assert_eq!(bob.document().text(run), "ABC");
    deliver(&mut bob, &mut alice);
    assert_eq!(alice.document().text(run), "ABC");
    assert_eq!(alice.document(), bob.document());
}

#[test]
fn nothing_is_sent_when_a_collaborator_already_removed_our_edit() {
    init_logging();
    let (mut alice, run) = client("alice");
    let (mut bob, _) = client("bob");

    alice.edit(vec![DocChange::insert(run, 1, Item::Text('X'))]);
    deliver(&mut alice, &mut bob);
    bob.edit(vec![DocChange::remove(run, 1, Item::Text('X'))]);
    deliver(&mut bob, &mut alice);

    assert_eq!(alice.undo_own(), 0);
    assert_eq!(alice.pending_count(), 0);
    assert_eq!(alice.document().text(run), "ABC");
    assert_eq!(alice.document(), bob.document());
    assert!(!alice.log().can_undo_own());
}

#[test]
fn repaired_undo_reaches_collaborators() {
    init_logging();
    let document = || {
        let mut doc = DocumentGraph::new();
        let body = doc.body();
        let (first, _) = doc.paragraph(body, "a");
        (doc, body, first)
    };
    let (doc, body, first) = document();
    let mut alice = EditSession::<DocChange>::new("alice", doc);
    let mut bob = EditSession::<DocChange>::new("bob", document().0);

    let added = alice.document().fresh_id();
    alice.edit(vec![
        DocChange::create(added, NodeKind::Paragraph),
        DocChange::insert(body, 1, Item::Node(added)),
        DocChange::insert(added, 0, Item::ParaEnd),
    ]);
    deliver(&mut alice, &mut bob);
    bob.edit(vec![DocChange::remove(body, 0, Item::Node(first))]);
    deliver(&mut bob, &mut alice);
    assert_eq!(alice.document(), bob.document());

    // the undo leaves the body empty, repair gives it a fresh paragraph
    assert_eq!(alice.undo_own(), 5);
    let blocks = alice.document().content(body).to_vec();
    assert_eq!(blocks.len(), 1);
    assert_ne!(blocks[0], Item::Node(added));

    assert_eq!(deliver(&mut alice, &mut bob), 5);
    assert_eq!(alice.document(), bob.document());
}

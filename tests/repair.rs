// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use local_undo::{
    RepairAction,
    model::{DocChange, DocumentGraph, Item, NodeId, NodeKind},
    repair::repair,
};

/// Runs the pass twice and checks the second run finds nothing.
/// Also checks that replaying the reported edits on the damaged document gives the same result.
fn repair_settled(doc: &mut DocumentGraph, touched: &[NodeId]) -> Vec<RepairAction<NodeId>> {
    let mut replica = doc.clone();
    let report = repair(doc, touched.iter().copied());
    for change in &report.changes {
        replica.apply(change);
    }
    assert_eq!(replica, *doc);
    let settled = doc.clone();
    assert!(repair(doc, touched.iter().copied()).is_clean());
    assert_eq!(*doc, settled);
    report.actions
}

fn index_of(doc: &DocumentGraph, parent: NodeId, item: Item) -> usize {
    doc.content(parent)
        .iter()
        .position(|candidate| *candidate == item)
        .unwrap()
}

fn remove_at(doc: &mut DocumentGraph, parent: NodeId, index: usize) {
    let removal = doc.removal(parent, index).unwrap();
    doc.apply(&removal);
}

fn insert_at(doc: &mut DocumentGraph, parent: NodeId, index: usize, item: Item) {
    doc.apply(&DocChange::insert(parent, index, item));
}

#[test]
fn removed_layout_takes_its_slides_along() {
    let mut doc = DocumentGraph::new();
    let layout = doc.layout();
    let slide = doc.slide(Some(layout));
    let shape = doc.add(slide, NodeKind::Drawing);
    let timing = doc.timing(slide, &[shape]);
    let comment = doc.comment(shape);
    let untouched = doc.slide(None);

    let presentation = doc.presentation();
    remove_at(&mut doc, presentation, 0);

    let actions = repair_settled(&mut doc, &[layout]);
    assert_eq!(
        actions,
        vec![
            RepairAction::RemovedSlide(slide),
            RepairAction::RemovedComment(comment),
        ]
    );
    assert!(!doc.is_alive(timing));
    assert!(doc.is_alive(untouched));
}

#[test]
fn timing_drops_removed_targets() {
    let mut doc = DocumentGraph::new();
    let slide = doc.slide(None);
    let kept = doc.add(slide, NodeKind::Drawing);
    let gone = doc.add(slide, NodeKind::Drawing);
    let timing = doc.timing(slide, &[kept, gone]);
    let at = index_of(&doc, slide, Item::Node(gone));
    remove_at(&mut doc, slide, at);

    let actions = repair_settled(&mut doc, &[slide, gone]);
    assert_eq!(
        actions,
        vec![RepairAction::DroppedTimingTarget {
            timing,
            target: gone
        }]
    );
    assert_eq!(doc.content(timing), &[Item::Ref(kept)]);
}

#[test]
fn rows_without_cells_are_dropped_then_empty_tables() {
    let mut doc = DocumentGraph::new();
    let body = doc.body();
    doc.paragraph(body, "before");
    let table = doc.table(body, 2, 1);
    doc.paragraph(body, "after");
    let rows: Vec<_> = doc.content(table).iter().filter_map(Item::node).collect();

    remove_at(&mut doc, rows[0], 0);
    let actions = repair_settled(&mut doc, &[rows[0]]);
    assert_eq!(
        actions,
        vec![RepairAction::DroppedRow {
            table,
            row: rows[0]
        }]
    );
    assert!(doc.is_alive(table));

    remove_at(&mut doc, rows[1], 0);
    let actions = repair_settled(&mut doc, &[rows[1]]);
    assert_eq!(
        actions,
        vec![
            RepairAction::DroppedRow {
                table,
                row: rows[1]
            },
            RepairAction::DroppedBlock {
                container: body,
                block: table
            },
        ]
    );
    assert_eq!(doc.text(body), "beforeafter");
}

#[test]
fn emptied_cell_gets_a_paragraph() {
    let mut doc = DocumentGraph::new();
    let body = doc.body();
    let table = doc.table(body, 1, 1);
    doc.paragraph(body, "");
    let row = doc.content(table)[0].node().unwrap();
    let cell = doc.content(row)[0].node().unwrap();
    remove_at(&mut doc, cell, 0);

    let actions = repair_settled(&mut doc, &[cell]);
    assert!(matches!(
        actions.as_slice(),
        [RepairAction::SynthesizedParagraph { container, .. }] if *container == cell
    ));
}

#[test]
fn paragraph_without_end_marker_is_fixed() {
    let mut doc = DocumentGraph::new();
    let body = doc.body();
    let (paragraph, run) = doc.paragraph(body, "text");
    let at = index_of(&doc, paragraph, Item::ParaEnd);
    remove_at(&mut doc, paragraph, at);

    let actions = repair_settled(&mut doc, &[paragraph]);
    assert_eq!(actions, vec![RepairAction::FixedParagraph(paragraph)]);
    assert_eq!(doc.content(paragraph), &[Item::Node(run), Item::ParaEnd]);
}

#[test]
fn paragraph_outside_a_container_is_an_orphan() {
    let mut doc = DocumentGraph::new();
    let body = doc.body();
    let (paragraph, run) = doc.paragraph(body, "a");
    let stray = doc.create(NodeKind::Paragraph);
    insert_at(&mut doc, run, 0, Item::Node(stray));

    let actions = repair_settled(&mut doc, &[stray, paragraph]);
    assert_eq!(actions, vec![RepairAction::RemovedOrphan(stray)]);
    assert!(!doc.is_alive(stray));
    assert!(doc.is_alive(paragraph));
}

#[test]
fn drawing_dropped_into_a_body_is_detached() {
    let mut doc = DocumentGraph::new();
    let body = doc.body();
    doc.paragraph(body, "");
    let shape = doc.create(NodeKind::Drawing);
    insert_at(&mut doc, body, 0, Item::Node(shape));

    let actions = repair_settled(&mut doc, &[body, shape]);
    assert_eq!(actions, vec![RepairAction::RemovedDrawing(shape)]);
    assert_eq!(doc.content(body).len(), 1);
}

#[test]
fn run_forgets_drawings_that_moved_away() {
    let mut doc = DocumentGraph::new();
    let run = doc.text_run("ab");
    let anchored = doc.add(run, NodeKind::Drawing);
    let slide = doc.slide(None);
    insert_at(&mut doc, slide, 0, Item::Node(anchored));

    let actions = repair_settled(&mut doc, &[anchored]);
    assert_eq!(
        actions,
        vec![RepairAction::StrippedAnchor {
            run,
            drawing: anchored
        }]
    );
    assert_eq!(doc.content(run), &[Item::Text('a'), Item::Text('b')]);
}

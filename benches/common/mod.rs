// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use local_undo::{
    ChangeLog,
    model::{DocChange, DocumentGraph, Item, NodeId},
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// A run of `initial` characters, one own insertion at its start and `tail` foreign edits of the
/// same run after it.
pub fn foreign_tail(initial: usize, tail: usize) -> (DocumentGraph, ChangeLog<DocChange>, NodeId) {
    local_undo::enable_determinism();

    let mut doc = DocumentGraph::new();
    let run = doc.text_run(&"a".repeat(initial));
    let mut log = ChangeLog::new();

    let own = DocChange::insert(run, 0, Item::Text('o'));
    doc.apply(&own);
    log.commit_own(vec![own]);

    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut len = initial + 1;
    let mut own_at = 0;
    for _ in 0..tail {
        // the own character is never removed
        let index = rng.random_range(0..len);
        let change = if index != own_at && rng.random_bool(0.4) {
            if index < own_at {
                own_at -= 1;
            }
            len -= 1;
            doc.removal(run, index)
        } else {
            if index <= own_at {
                own_at += 1;
            }
            len += 1;
            Some(DocChange::insert(run, index, Item::Text('f')))
        };
        if let Some(change) = change {
            doc.apply(&change);
            log.append(change);
        }
    }
    (doc, log, run)
}

/// A body of `paragraphs` short paragraphs.
pub fn long_body(paragraphs: usize) -> (DocumentGraph, NodeId) {
    local_undo::enable_determinism();

    let mut doc = DocumentGraph::new();
    let body = doc.body();
    for _ in 0..paragraphs {
        doc.paragraph(body, "lorem");
    }
    (doc, body)
}

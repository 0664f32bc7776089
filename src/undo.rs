// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use crate::{
    change::Change,
    commute::commute_content,
    log::ChangeLog,
    repair::{self, RepairGraph},
    reverse::build_reverse,
};
use std::collections::BTreeSet;
use tracing::debug;

impl<C: Change> ChangeLog<C>
where
    C::Document: RepairGraph<Id = C::Target, Edit = C>,
{
    /// Undoes the most recent own range, keeping every foreign change made since.
    ///
    /// Each own change is rebased past the tail of the log, newest first. Content changes whose
    /// every action conflicts with a foreign one are abandoned, as are property changes that no
    /// longer pass [`Change::check_validity`]. The inverses of what is left are replayed into
    /// `doc`, appended to the log as a Point of their own and the touched objects are repaired.
    /// The repair edits join the same Point, after the inverses.
    ///
    /// Returns the inverses followed by the repair edits, in the order they were applied, for
    /// transmission and re-layout. The result is empty if there is no own range or nothing in it
    /// could be undone; the range is consumed either way.
    pub fn undo_own_point(&mut self, doc: &mut C::Document) -> Vec<C> {
        let Some(range) = self.own_ranges.pop() else {
            debug!("no own range to undo");
            return Vec::new();
        };
        debug!(
            position = range.position,
            length = range.length,
            "undoing own range"
        );
        let end = range.end().min(self.entries.len());

        let mut kept = Vec::with_capacity(range.length);
        let mut dropped = 0;
        for index in (range.position..end).rev() {
            let entry = &self.entries[index];
            if entry.is_description_change() {
                continue;
            }
            if entry.is_content_change() {
                let mut copy = entry.clone();
                let commutation = commute_content(&mut copy, &self.entries, end);
                let survived = commutation.survived();
                // conflicting actions cancelled a later action each, so the original is spent
                // even when nothing of it is left to undo
                let spent = survived || commutation.dropped > 0;
                self.replace_actions(commutation.rewrites);
                if spent {
                    self.entries[index].set_reverted(true);
                }
                if survived {
                    kept.push(copy);
                } else {
                    dropped += 1;
                }
            } else if entry.check_validity(doc) {
                kept.push(entry.clone());
            } else {
                dropped += 1;
            }
        }

        let kept_count = kept.len();
        let mut inverses = build_reverse(kept);
        let inverse_count = inverses.len();
        if !inverses.is_empty() {
            let mut touched = BTreeSet::new();
            for inverse in &inverses {
                inverse.load(doc);
                touched.extend(inverse.affected());
            }
            self.entries.extend(C::point_boundary());
            self.entries.extend(inverses.iter().cloned());
            if self.config.repair {
                let report = repair::repair(doc, touched);
                debug!(
                    fixes = report.actions.len(),
                    changes = report.changes.len(),
                    "repaired after own undo"
                );
                self.entries.extend(report.changes.iter().cloned());
                inverses.extend(report.changes);
            }
        }
        debug!(
            kept = kept_count,
            dropped,
            inverses = inverse_count,
            repairs = inverses.len() - inverse_count,
            "own undo finished"
        );
        inverses
    }
}

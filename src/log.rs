// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The change log of one client and the bookkeeping of which spans of it are its own.
use crate::{
    change::Change,
    commute::Rewrites,
    config::UndoConfig,
    error::LogError,
};
use tracing::{debug, warn};

/// A contiguous slice of log indices produced by one locally committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct OwnRange {
    pub position: usize,
    pub length: usize,
}

impl OwnRange {
    pub fn new(position: usize, length: usize) -> Self {
        Self { position, length }
    }

    /// One past the last index of the range.
    pub fn end(&self) -> usize {
        self.position + self.length
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.position..self.end()).contains(&index)
    }
}

/// One client's view of the document history.
///
/// The log is a single total order of changes: local edits, remote edits in arrival order, and
/// the inverse batches produced by local undo. It only ever grows at the tail and only ever
/// shrinks from the tail.
///
/// Next to the entries it keeps a stack of [`OwnRange`]s, one per locally committed batch, which
/// are pairwise disjoint and strictly increasing.
///
/// # Example
///
/// ```rust
/// use local_undo::{ChangeLog, model::{DocChange, DocumentGraph, Item}};
///
/// let mut doc = DocumentGraph::new();
/// let run = doc.text_run("");
/// let mut log = ChangeLog::<DocChange>::new();
///
/// let typed = DocChange::insert(run, 0, Item::Text('a'));
/// doc.apply(&typed);
/// log.commit_own_batch(vec![typed], None).unwrap();
/// assert!(log.can_undo_own());
///
/// let undone = log.undo_global(1, &mut doc);
/// assert_eq!(undone.len(), 1);
/// assert_eq!(doc.text(run), "");
/// assert!(!log.can_undo_own());
/// ```
#[derive(Debug, Clone)]
pub struct ChangeLog<C> {
    pub(crate) entries: Vec<C>,
    pub(crate) own_ranges: Vec<OwnRange>,
    sync_boundary: usize,
    pub(crate) config: UndoConfig,
}

impl<C> Default for ChangeLog<C> {
    fn default() -> Self {
        Self::with_config(UndoConfig::default())
    }
}

impl<C> ChangeLog<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            entries: Vec::new(),
            own_ranges: Vec::new(),
            sync_boundary: 0,
            config,
        }
    }

    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    /// All changes, oldest first.
    pub fn all_changes(&self) -> &[C] {
        &self.entries
    }

    pub fn change_count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&C> {
        self.entries.get(index)
    }

    /// Own ranges, oldest first.
    pub fn own_ranges(&self) -> &[OwnRange] {
        &self.own_ranges
    }

    /// Length of the log at the last acknowledged synchronisation.
    pub fn sync_boundary(&self) -> usize {
        self.sync_boundary
    }

    pub fn can_undo_global(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn can_undo_own(&self) -> bool {
        !self.own_ranges.is_empty()
    }

    /// Pushes a change to the tail, as done for remote edits.
    pub fn append(&mut self, change: C) {
        self.entries.push(change);
    }

    /// Records a batch of local changes.
    ///
    /// With `discard_from`, the log is first truncated back to `sync_boundary + discard_from`,
    /// abandoning local changes made after the last acknowledged synchronisation. Without it, the
    /// current tail becomes the new sync boundary.
    ///
    /// A non-empty batch becomes a new own range.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DiscardOutOfRange`] if the discard point lies past the tail. The log
    /// is left unchanged in that case.
    pub fn commit_own_batch(
        &mut self,
        own_changes: Vec<C>,
        discard_from: Option<usize>,
    ) -> Result<(), LogError> {
        match discard_from {
            Some(offset) => {
                let len = self.discard_point(offset)?;
                self.truncate(len);
            }
            None => self.mark_synced(),
        }
        self.push_batch(own_changes);
        Ok(())
    }

    /// Records a batch of local changes made on top of everything in the log.
    ///
    /// This is [`ChangeLog::commit_own_batch`] without a discard offset, which cannot fail.
    pub fn commit_own(&mut self, own_changes: Vec<C>) {
        self.mark_synced();
        self.push_batch(own_changes);
    }

    /// Moves the sync boundary to the current tail.
    pub fn mark_synced(&mut self) {
        self.sync_boundary = self.entries.len();
    }

    fn push_batch(&mut self, own_changes: Vec<C>) {
        if own_changes.is_empty() {
            return;
        }
        let range = OwnRange::new(self.entries.len(), own_changes.len());
        self.entries.extend(own_changes);
        self.push_own_range(range);
    }

    /// The log length a discard `offset` changes past the sync boundary truncates to.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::DiscardOutOfRange`] if that lies past the tail.
    pub fn discard_point(&self, offset: usize) -> Result<usize, LogError> {
        let requested = self.sync_boundary + offset;
        if requested > self.entries.len() {
            warn!(
                requested,
                available = self.entries.len(),
                "refusing to discard past the tail"
            );
            return Err(LogError::DiscardOutOfRange {
                requested,
                available: self.entries.len(),
            });
        }
        Ok(requested)
    }

    fn push_own_range(&mut self, range: OwnRange) {
        self.own_ranges.push(range);
        if self.config.exceeds_own_ranges(self.own_ranges.len()) {
            let forgotten = self.own_ranges.remove(0);
            debug!(
                position = forgotten.position,
                length = forgotten.length,
                "own range fell off the undo stack"
            );
        }
    }

    /// Drops everything from `len` on, clamping the own ranges and the sync boundary.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
        self.sync_boundary = self.sync_boundary.min(len);
        self.own_ranges.retain_mut(|range| {
            if range.end() > len {
                range.length = len.saturating_sub(range.position);
            }
            range.length > 0
        });
    }

    /// Checks that own ranges are disjoint, increasing and inside the log.
    ///
    /// # Errors
    ///
    /// Returns the first offending range as [`LogError::OwnRangeOutOfBounds`].
    pub fn check_invariants(&self) -> Result<(), LogError> {
        let mut floor = 0;
        for range in &self.own_ranges {
            if range.position < floor || range.end() > self.entries.len() || range.length == 0 {
                return Err(LogError::OwnRangeOutOfBounds {
                    position: range.position,
                    length: range.length,
                    log_len: self.entries.len(),
                });
            }
            floor = range.end();
        }
        Ok(())
    }
}

impl<C: Change> ChangeLog<C> {
    /// Undoes up to `count` changes from the tail, most recent first.
    ///
    /// Content changes are split into single-element changes which are undone last to first.
    /// Returns what was undone, in the order it was undone.
    pub fn undo_global(&mut self, count: usize, doc: &mut C::Document) -> Vec<C> {
        let count = count.min(self.entries.len());
        let start = self.entries.len() - count;
        let mut undone = Vec::with_capacity(count);
        for change in self.entries[start..].iter().rev() {
            if change.is_content_change() {
                for simple in change.to_simple_changes().into_iter().rev() {
                    simple.undo(doc);
                    undone.push(simple);
                }
            } else {
                change.undo(doc);
                undone.push(change.clone());
            }
        }
        self.truncate(start);
        undone
    }

    /// Undoes the tail of the log back to, and including, the most recent Point boundary.
    ///
    /// Does nothing if no boundary is left in the log.
    pub fn undo_global_point(&mut self, doc: &mut C::Document) -> Vec<C> {
        match self
            .entries
            .iter()
            .rposition(|change| change.is_description_change())
        {
            Some(boundary) => {
                let count = self.entries.len() - boundary;
                self.undo_global(count, doc)
            }
            None => Vec::new(),
        }
    }

    /// Replaces the action lists of the entries named in `rewrites`.
    ///
    /// This is the only way the engine modifies entries that are already in the log.
    pub fn replace_actions(&mut self, rewrites: Rewrites<C::Item>) {
        for (index, actions) in rewrites {
            if let Some(entry) = self.entries.get_mut(index) {
                entry.from_simple_actions(actions);
            }
        }
    }
}

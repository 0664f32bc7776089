// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Rebasing the positions of an own edit past everything that happened after it.
//!
//! Given an own content change sitting at some index of the log, commutation answers: "which
//! positions would this change have had if it had been applied at the very end of the log?" It
//! does so one [`SimpleAction`] at a time, swapping the own action with every later action on the
//! same collection. Each swap rewrites *both* sides: the own action moves past the later one, and
//! the later one is re-expressed as if the own action had never happened. That second half is
//! what keeps the log coherent for the next own change to be rebased.
//!
//! The swap rule is [`transform`]. It is an asymmetric table kept exactly as is: the tie-breaks
//! on equal indices differ per combination of insertion/removal, and a "cleaner" symmetric rule
//! would silently produce different documents.
//!
//! Nothing in here mutates the log. [`commute_content`] stages the new action lists of rewritten
//! log entries in [`Rewrites`], and the caller applies them with
//! [`ChangeLog::replace_actions`](crate::ChangeLog::replace_actions).
use crate::change::{Change, SimpleAction};
use std::collections::BTreeMap;
use tracing::trace;

/// Outcome of swapping an own action with a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Both actions were adjusted (or left alone) and remain meaningful.
    Commuted,
    /// Both actions touch the identical slot from incompatible directions.
    Conflict,
}

/// Swaps `own` past `later`, where `later` was applied after `own` on the same collection.
///
/// | own \ later | insertion | removal |
/// |---|---|---|
/// | **insertion** | `own >= later` → `own += 1`; else `later -= 1` | `own > later` → `own -= 1`; `own == later` → conflict; else `later -= 1` |
/// | **removal** | `own >= later` → `own += 1`; else `later += 1` | `own > later` → `own -= 1`; else `later += 1` |
///
/// On [`Transform::Conflict`] neither action is modified.
pub fn transform<T>(own: &mut SimpleAction<T>, later: &mut SimpleAction<T>) -> Transform {
    match (own.is_insertion, later.is_insertion) {
        (true, true) => {
            if own.index >= later.index {
                own.index += 1;
            } else {
                later.index -= 1;
            }
        }
        (true, false) => {
            if own.index > later.index {
                own.index -= 1;
            } else if own.index == later.index {
                return Transform::Conflict;
            } else {
                later.index -= 1;
            }
        }
        (false, true) => {
            if own.index >= later.index {
                own.index += 1;
            } else {
                later.index += 1;
            }
        }
        (false, false) => {
            if own.index > later.index {
                own.index -= 1;
            } else {
                later.index += 1;
            }
        }
    }
    Transform::Commuted
}

/// New action lists for log entries, keyed by log index.
///
/// Entries are staged in log order. Applying them replaces the whole action list of each entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrites<T> {
    entries: BTreeMap<usize, Vec<SimpleAction<T>>>,
}

impl<T> Default for Rewrites<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Rewrites<T> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The staged action list for the log entry at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&[SimpleAction<T>]> {
        self.entries.get(&index).map(Vec::as_slice)
    }

    /// Log indices with a staged rewrite, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }
}

impl<T> IntoIterator for Rewrites<T> {
    type Item = (usize, Vec<SimpleAction<T>>);
    type IntoIter = std::collections::btree_map::IntoIter<usize, Vec<SimpleAction<T>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Result of [`commute_content`].
#[derive(Debug, Clone)]
#[must_use = "rewrites of later log entries must be applied to keep the log coherent"]
pub struct Commutation<T> {
    /// Own actions that made it to the end of the log.
    pub kept: usize,
    /// Own actions abandoned on a conflict.
    pub dropped: usize,
    /// New versions of the later entries the own actions were swapped with.
    pub rewrites: Rewrites<T>,
}

impl<T> Commutation<T> {
    /// Whether at least one own action survived, so the working copy is usable.
    pub fn survived(&self) -> bool {
        self.kept > 0
    }
}

/// Rebases the content change `change` past `log[from..]`.
///
/// `change` is a working copy of a log entry sitting before `from`. Its actions are walked from
/// the last to the first (undo order); each one is swapped, in strict log order, with every action
/// of every later entry that edits the same collection and is not reverted. When a swap reports a
/// [`Transform::Conflict`], the later action is dropped from its entry and the own action is
/// abandoned, without touching the remaining own actions.
///
/// If any own action survives, `change` is reassembled from the survivors in their original
/// order. Otherwise `change` is left as it was and [`Commutation::survived`] is false. Either way
/// the returned rewrites must be applied to the log.
pub fn commute_content<C: Change>(change: &mut C, log: &[C], from: usize) -> Commutation<C::Item> {
    let actions = change.to_simple_actions();
    let mut staged: BTreeMap<usize, Vec<SimpleAction<C::Item>>> = BTreeMap::new();
    let mut survivors = Vec::with_capacity(actions.len());
    let mut dropped = 0;

    for (own_pos, mut own) in actions.into_iter().enumerate().rev() {
        let mut alive = true;
        'scan: for (index, later) in log.iter().enumerate().skip(from) {
            if later.is_reverted() || !change.is_related_to(later) {
                continue;
            }
            let later_actions = staged
                .entry(index)
                .or_insert_with(|| later.to_simple_actions());
            for later_pos in 0..later_actions.len() {
                if transform(&mut own, &mut later_actions[later_pos]) == Transform::Conflict {
                    trace!(
                        own = own_pos,
                        later = later_pos,
                        log_index = index,
                        slot = own.index,
                        "conflicting actions, abandoning own action"
                    );
                    later_actions.remove(later_pos);
                    alive = false;
                    break 'scan;
                }
            }
        }
        if alive {
            survivors.push(own);
        } else {
            dropped += 1;
        }
    }

    let kept = survivors.len();
    if kept > 0 {
        survivors.reverse();
        change.from_simple_actions(survivors);
    }
    Commutation {
        kept,
        dropped,
        rewrites: Rewrites { entries: staged },
    }
}

// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Turning the surviving own changes of an undo into the batch that cancels them.
use crate::change::Change;

/// Inverts every change in `kept`, preserving order.
///
/// `kept` is expected newest first, which is the order the inverses must be applied in. Changes
/// without an inverse are skipped. Every inverse is marked reverted, so no later own undo picks
/// it up again.
pub fn build_reverse<C: Change>(kept: impl IntoIterator<Item = C>) -> Vec<C> {
    kept.into_iter()
        .filter_map(|change| change.create_reverse_change())
        .map(|mut inverse| {
            inverse.set_reverted(true);
            inverse
        })
        .collect()
}

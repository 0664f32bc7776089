// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Tunables of a [`ChangeLog`](crate::ChangeLog).

/// Configuration injected into a [`ChangeLog`](crate::ChangeLog).
///
/// # Example
///
/// ```rust
/// use local_undo::{ChangeLog, UndoConfig, model::DocChange};
///
/// let config = UndoConfig::default().with_max_own_ranges(20).with_repair(false);
/// let log = ChangeLog::<DocChange>::with_config(config);
/// assert_eq!(log.config().max_own_ranges, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UndoConfig {
    /// How many own ranges stay undoable. Older ones are forgotten first. `0` means unlimited.
    pub max_own_ranges: usize,
    /// Whether an own undo runs the consistency repair pass over the objects it touched.
    pub repair: bool,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_own_ranges: 100,
            repair: true,
        }
    }
}

impl UndoConfig {
    pub fn with_max_own_ranges(mut self, max_own_ranges: usize) -> Self {
        self.max_own_ranges = max_own_ranges;
        self
    }

    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    /// Whether a stack of `len` own ranges exceeds the configured cap.
    pub(crate) fn exceeds_own_ranges(&self, len: usize) -> bool {
        self.max_own_ranges > 0 && len > self.max_own_ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_unlimited() {
        let config = UndoConfig::default().with_max_own_ranges(0);
        assert!(!config.exceeds_own_ranges(usize::MAX));
        let config = config.with_max_own_ranges(2);
        assert!(!config.exceeds_own_ranges(2));
        assert!(config.exceeds_own_ranges(3));
    }

    #[quickcheck]
    fn qc_own_range_stack_respects_cap(config: UndoConfig, batches: u8) {
        use crate::{
            ChangeLog,
            model::{DocChange, Item, NodeId},
        };
        let mut log = ChangeLog::with_config(config);
        for i in 0..batches % 32 {
            let change = DocChange::insert(NodeId(1), usize::from(i), Item::Text('x'));
            log.commit_own_batch(vec![change], None).unwrap();
        }
        let expected = match config.max_own_ranges {
            0 => usize::from(batches % 32),
            cap => cap.min(usize::from(batches % 32)),
        };
        assert_eq!(log.own_ranges().len(), expected);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: UndoConfig = serde_json::from_str(r#"{ "repair": false }"#).unwrap();
        assert_eq!(config, UndoConfig::default().with_repair(false));
    }
}

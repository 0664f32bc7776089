// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use std::fmt;

/// Error returned by [`ChangeLog`](crate::ChangeLog) operations that take positions from the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// A discard offset pointed past the tail of the log.
    DiscardOutOfRange { requested: usize, available: usize },

    /// An own range reaches outside the log or overlaps its predecessor.
    OwnRangeOutOfBounds {
        position: usize,
        length: usize,
        log_len: usize,
    },
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::DiscardOutOfRange {
                requested,
                available,
            } => write!(
                f,
                "cannot discard back to index {requested}, the log only holds {available} changes"
            ),
            LogError::OwnRangeOutOfBounds {
                position,
                length,
                log_len,
            } => write!(
                f,
                "own range {position}+{length} is out of order or outside a log of {log_len} changes"
            ),
        }
    }
}

impl std::error::Error for LogError {}

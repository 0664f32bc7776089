// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # local-undo: Per-Client Undo for Collaborative Editing
//!
//! This crate lets one collaborator undo *only their own* most recent edit after edits from other
//! users have already been interleaved into the shared document. It works entirely on the
//! client: no server round-trip, no document lock, and no damage to anyone else's concurrent
//! work.
//!
//! The shared document history, as observed by this client, is a [`ChangeLog`]: a single total
//! order of edit records. Some contiguous spans of the log were produced locally; those spans
//! are tracked as [`OwnRange`]s. Undoing the latest own range means:
//!
//! 1. rebasing ("commuting") the positions recorded in each own edit past everything appended
//!    after it, see [`commute`];
//! 2. deriving the inverse of whatever survived, see [`reverse`];
//! 3. replaying the inverses, appending them to the log as a new Point and fixing up any
//!    structural damage in the document graph, see [`repair`]. The fixes are edits too: they join
//!    the same Point and go out to collaborators with the inverses.
//!
//! ## Core Concepts
//!
//! - [`Change`]: the contract edit records of the document model must implement. A change is
//!   either a *content* change, made of [`SimpleAction`]s that add or remove elements of one
//!   ordered collection, or a *property* change of one scalar attribute.
//! - [`ChangeLog`]: append-only sequence of changes plus the own-range stack. Index is the sole
//!   ordering authority.
//! - [`RepairGraph`]: the view of the document graph the repair pass needs, organised around the
//!   closed [`Category`] enum.
//!
//! ## Degrading Instead of Failing
//!
//! When a foreign edit touched exactly the slot an own edit touched, from an incompatible
//! direction, that one element cannot be restored safely. The engine drops it and continues with
//! the rest. A heavily contested undo may therefore undo less than requested, or nothing at all.
//! This is never reported as an error: undoing less is always preferable to corrupting a
//! collaborator's work.
//!
//! ## Getting Started
//!
//! ```rust
//! use local_undo::{
//!     ChangeLog,
//!     model::{DocChange, DocumentGraph, Item},
//! };
//!
//! let mut doc = DocumentGraph::new();
//! let run = doc.text_run("ABC");
//! let mut log = ChangeLog::<DocChange>::new();
//!
//! // We insert X at 1: ABC -> AXBC.
//! let own = DocChange::insert(run, 1, Item::Text('X'));
//! doc.apply(&own);
//! log.commit_own_batch(vec![own], None).unwrap();
//!
//! // A collaborator inserts Y at 1: AXBC -> AYXBC.
//! let remote = DocChange::insert(run, 1, Item::Text('Y'));
//! doc.apply(&remote);
//! log.append(remote);
//!
//! // Undoing our edit keeps theirs.
//! let outgoing = log.undo_own_point(&mut doc);
//! assert_eq!(outgoing.len(), 1);
//! assert_eq!(doc.text(run), "AYBC");
//! ```
//!
//! ## Scope of this Crate
//!
//! The document object model, the transport delivering remote edits and the encoder for outgoing
//! ones are collaborators, not part of this crate. [`model`] ships a small reference office
//! document graph that implements every trait the engine needs; it is what the tests and benches
//! run against, and a template for real models.
//!
//! **There is no concurrency control in here.** All log mutation is expected to happen on one
//! editing thread. A caller that drives the log from several tasks must treat
//! [`ChangeLog::undo_own_point`] as a single critical section over the log.
//!
//! ## Features
//!
//! - `serde`: Provides `serde` support for actions, ranges, configuration and the reference model.
//! - `arbitrary`: Implements `quickcheck::Arbitrary` for log and model types, useful for
//!   property-based testing.
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use ahash::RandomState;
use std::{
    hash::BuildHasher,
    sync::atomic::{AtomicBool, Ordering},
};

// Use a constant seed for hashing to make performance benchmarks have less variance.
pub(crate) const DETERMINISTIC_HASHER: RandomState = RandomState::with_seeds(48, 1516, 23, 42);

pub mod change;
pub use change::{Affected, Change, ChangeKind, SimpleAction};
pub mod commute;
pub use commute::{Commutation, Rewrites, Transform};
pub mod config;
pub use config::UndoConfig;
mod error;
pub use error::LogError;
mod log;
pub use log::{ChangeLog, OwnRange};
/// Macros usable for tests and initialization
pub mod macros;
pub mod model;
pub mod repair;
pub use repair::{Category, Classify, RepairAction, RepairGraph, RepairReport};
pub mod reverse;
pub mod session;
pub use session::EditSession;
mod undo;

#[cfg(any(test, feature = "arbitrary"))]
pub mod test_util;

static ENABLE_DETERMINISM: AtomicBool = AtomicBool::new(false);

/// Makes all hash-based data structures behave deterministically.
///
/// This should only be enabled for testing, as it increases the odds of DoS
/// scenarios.
#[doc(hidden)]
pub fn enable_determinism() {
    ENABLE_DETERMINISM.store(true, Ordering::Release);
}

/// Checks if determinism is enabled.
///
/// Should be used internally and for testing.
#[doc(hidden)]
pub fn determinism_enabled() -> bool {
    ENABLE_DETERMINISM.load(Ordering::Acquire)
}

/// Create a random state for a hashmap.
/// If `enable_determinism` has been used, this will return a deterministic
/// decidedly non-random RandomState, useful in tests.
#[inline]
fn make_random_state() -> RandomState {
    if determinism_enabled() {
        DETERMINISTIC_HASHER
    } else {
        RandomState::new()
    }
}

fn create_map<K, V>() -> std::collections::HashMap<K, V, UndoRandomState> {
    std::collections::HashMap::with_hasher(UndoRandomState::default())
}

/// This is a small wrapper around the ahash RandomState.
/// This allows us to easily switch to a non-random RandomState for use in tests.
#[derive(Clone)]
pub struct UndoRandomState {
    inner: RandomState,
}

impl Default for UndoRandomState {
    #[inline]
    fn default() -> Self {
        Self {
            inner: make_random_state(),
        }
    }
}

// All we do is delegate to the wrapped 'inner' RandomState.
impl BuildHasher for UndoRandomState {
    type Hasher = <RandomState as BuildHasher>::Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        self.inner.build_hasher()
    }
}

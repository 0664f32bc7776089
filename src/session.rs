// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # Edit Session
//!
//! One client's view of a document: the live document, its [`ChangeLog`] and the queue of
//! changes waiting to be sent to collaborators.
//!
//! The session is the only place that both mutates the document and records the mutation, so
//! the two cannot drift apart. Remote changes arrive already decoded and in arrival order; the
//! outgoing queue is drained by whatever encodes and transmits them.
use crate::{ChangeLog, LogError, RepairGraph, UndoConfig, change::Change};
use std::mem;
use tracing::debug;

/// Drives a [`ChangeLog`] and the document it describes.
///
/// ```rust
/// use local_undo::{EditSession, model::{DocChange, DocumentGraph, Item}};
///
/// let mut doc = DocumentGraph::new();
/// let run = doc.text_run("");
/// let mut session = EditSession::<DocChange>::new("alice", doc);
///
/// session.edit(vec![DocChange::insert(run, 0, Item::Text('a'))]);
/// session.receive_remote(DocChange::insert(run, 0, Item::Text('b')));
/// assert_eq!(session.document().text(run), "ba");
///
/// session.undo_own();
/// assert_eq!(session.document().text(run), "b");
/// // our edit and its undo, the remote one was received from the wire
/// assert_eq!(session.take_outgoing().len(), 2);
/// ```
#[derive(Debug)]
pub struct EditSession<C: Change> {
    pub id: String,
    document: C::Document,
    log: ChangeLog<C>,
    outgoing: Vec<C>,
}

impl<C: Change> EditSession<C> {
    pub fn new(id: impl Into<String>, document: C::Document) -> Self {
        Self::with_config(id, document, UndoConfig::default())
    }

    pub fn with_config(id: impl Into<String>, document: C::Document, config: UndoConfig) -> Self {
        Self {
            id: id.into(),
            document,
            log: ChangeLog::with_config(config),
            outgoing: Vec::new(),
        }
    }

    pub fn document(&self) -> &C::Document {
        &self.document
    }

    pub fn log(&self) -> &ChangeLog<C> {
        &self.log
    }

    /// Changes queued for transmission since the last [`EditSession::take_outgoing`].
    pub fn pending_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Applies a local batch, records it as one own range and queues it for transmission.
    pub fn edit(&mut self, batch: Vec<C>) {
        for change in &batch {
            change.redo(&mut self.document);
        }
        self.outgoing.extend(batch.iter().cloned());
        self.log.commit_own(batch);
    }

    /// Applies a change received from a collaborator.
    ///
    /// Whether a change was reverted is a property of the sender's log, so it is cleared here.
    pub fn receive_remote(&mut self, mut change: C) {
        change.set_reverted(false);
        change.load(&mut self.document);
        self.log.append(change);
    }

    /// Marks everything received and sent so far as acknowledged.
    pub fn acknowledge(&mut self) {
        self.log.mark_synced();
    }

    /// Rolls the document back to `discard_from` changes past the last acknowledged state, then
    /// applies `batch` as a new own range.
    ///
    /// Returns the rolled back changes, most recent first.
    ///
    /// # Errors
    ///
    /// Fails with [`LogError::DiscardOutOfRange`] if the discard point is past the tail. Nothing
    /// is changed in that case.
    pub fn resync(&mut self, batch: Vec<C>, discard_from: usize) -> Result<Vec<C>, LogError> {
        let len = self.log.discard_point(discard_from)?;
        let rolled_back = self
            .log
            .undo_global(self.log.change_count() - len, &mut self.document);
        for change in &batch {
            change.redo(&mut self.document);
        }
        self.outgoing.extend(batch.iter().cloned());
        self.log.commit_own_batch(batch, Some(discard_from))?;
        debug!(
            session = %self.id,
            rolled_back = rolled_back.len(),
            "resynchronised"
        );
        Ok(rolled_back)
    }

    /// Rolls back the tail of the log to the most recent Point boundary, locally.
    pub fn undo_global_point(&mut self) -> Vec<C> {
        self.log.undo_global_point(&mut self.document)
    }

    /// Drains the outgoing queue.
    pub fn take_outgoing(&mut self) -> Vec<C> {
        mem::take(&mut self.outgoing)
    }
}

impl<C: Change> EditSession<C>
where
    C::Document: RepairGraph<Id = C::Target, Edit = C>,
{
    /// Undoes this client's most recent own batch and queues the inverses, with any repair
    /// edits that followed them, for transmission.
    ///
    /// Returns how many changes were queued, zero if nothing could be undone.
    pub fn undo_own(&mut self) -> usize {
        let changes = self.log.undo_own_point(&mut self.document);
        debug!(session = %self.id, changes = changes.len(), "own undo");
        let count = changes.len();
        self.outgoing.extend(changes);
        count
    }
}

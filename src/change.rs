// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The edit-record contract consumed by the undo engine.
//!
//! The document model owns its edits. This crate only needs to look at them through the
//! [`Change`] trait: whether an edit mutates an ordered collection (a *content* change) or a
//! single scalar attribute (a *property* change), how to split a content change into
//! [`SimpleAction`]s and put it back together, and how to derive its inverse.
//!
//! Positions inside a [`SimpleAction`] are always relative to the length of the target collection
//! at the moment the action is interpreted, never fixed document offsets. That is what makes
//! them transformable by [`commute`](crate::commute).
use smallvec::SmallVec;
use std::{fmt, hash::Hash};

/// Whether a change mutates an ordered child collection or a scalar attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum ChangeKind {
    /// Adds or removes elements of an ordered collection owned by the target.
    Content,
    /// Replaces the value of one attribute of the target.
    Property,
}

/// One element added to, or removed from, one ordered collection.
///
/// `index` is the slot the element occupies right after an insertion, or occupied right before a
/// removal. `payload` is the element itself, which is what makes the action invertible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct SimpleAction<T> {
    pub is_insertion: bool,
    pub index: usize,
    pub payload: T,
}

impl<T> SimpleAction<T> {
    pub fn insert(index: usize, payload: T) -> Self {
        Self {
            is_insertion: true,
            index,
            payload,
        }
    }

    pub fn remove(index: usize, payload: T) -> Self {
        Self {
            is_insertion: false,
            index,
            payload,
        }
    }

    /// The action that cancels this one when applied right after it.
    pub fn inverted(self) -> Self {
        Self {
            is_insertion: !self.is_insertion,
            ..self
        }
    }
}

/// Objects an edit touched, usually one or two.
pub type Affected<T> = SmallVec<[T; 2]>;

/// An edit record produced by the document model.
///
/// Implementors are cheap-ish value types: the engine clones entries when it needs a working copy
/// to rebase, and replaces the action list of log entries when commutation rewrites them.
///
/// The document the edit applies to is passed explicitly to every method that reads or mutates
/// it. Nothing in this crate reaches for a global document.
pub trait Change: Clone + fmt::Debug {
    /// The live document edits are replayed into.
    type Document;

    /// Identifies the object owning the mutated collection or attribute.
    type Target: Clone + Eq + Ord + Hash + fmt::Debug;

    /// Element type of content changes.
    type Item: Clone + fmt::Debug;

    fn kind(&self) -> ChangeKind;

    fn is_content_change(&self) -> bool {
        self.kind() == ChangeKind::Content
    }

    /// True for markers that open a new Point (one undoable user action).
    fn is_description_change(&self) -> bool;

    /// Splits a compound record into single-element units.
    ///
    /// Applying the returned changes in order must be equivalent to applying `self`.
    fn to_simple_changes(&self) -> Vec<Self>;

    /// The ordered actions of a content change. Empty for property changes.
    fn to_simple_actions(&self) -> Vec<SimpleAction<Self::Item>>;

    /// Replaces the actions of a content change. Property changes ignore this.
    fn from_simple_actions(&mut self, actions: Vec<SimpleAction<Self::Item>>);

    fn target(&self) -> Self::Target;

    /// Whether both changes edit the very same ordered collection.
    fn is_related_to(&self, other: &Self) -> bool {
        self.is_content_change() && other.is_content_change() && self.target() == other.target()
    }

    fn is_reverted(&self) -> bool;

    fn set_reverted(&mut self, reverted: bool);

    /// The semantic inverse of this change, if it has one.
    ///
    /// Applying the inverse right after `self` must restore the state from right before `self`.
    fn create_reverse_change(&self) -> Option<Self>;

    fn undo(&self, doc: &mut Self::Document);

    fn redo(&self, doc: &mut Self::Document);

    /// Replays the change into the live document, as done for remote edits.
    fn load(&self, doc: &mut Self::Document) {
        self.redo(doc)
    }

    /// Domain validity check for property changes against the current document.
    #[expect(unused_variables)]
    fn check_validity(&self, doc: &Self::Document) -> bool {
        true
    }

    fn element_count(&self) -> usize;

    /// Every object this change touched: its target and any object it inserted or removed.
    fn affected(&self) -> Affected<Self::Target> {
        smallvec::smallvec![self.target()]
    }

    /// A description change opening a Point for engine-produced batches, if the model has them.
    fn point_boundary() -> Option<Self> {
        None
    }
}

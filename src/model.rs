// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # A Reference Office Document Graph
//!
//! The undo engine does not own a document model, it talks to one through [`Change`] and
//! [`RepairGraph`]. This module is a small but complete model implementing both, covering the
//! structures a word-processing or presentation document is made of:
//!
//! - containers ([`NodeKind::Body`], table [`NodeKind::Cell`]s and shape [`NodeKind::TextBody`]s)
//!   holding paragraphs and tables;
//! - [`NodeKind::Paragraph`]s holding runs and ending with an [`Item::ParaEnd`] marker;
//! - [`NodeKind::Run`]s holding text and drawing anchors;
//! - [`NodeKind::Drawing`]s and [`NodeKind::Group`]s of drawings;
//! - [`NodeKind::Table`]s of [`NodeKind::Row`]s of cells;
//! - a [`NodeKind::Presentation`] of [`NodeKind::Layout`]s and [`NodeKind::Slide`]s, slides holding
//!   drawings and an animation [`NodeKind::Timing`];
//! - [`NodeKind::Comment`]s anchored to any object.
//!
//! Every node lives in one arena keyed by [`NodeId`] and owns an ordered `content` list. Content
//! changes ([`DocChange`]) insert and remove [`Item`]s of that list; property changes set one
//! [`Property`] of a node; creation changes add a detached node to the arena. Nodes removed from
//! their parent stay in the arena, detached, so that an undo can put them back. There is no
//! tombstone: a node is gone exactly when it is no longer reachable from the root.
//!
//! Ids are handed out from one counter per graph, and a received creation moves the counter past
//! the id it names. Replicas only agree on ids while creations do not race; a production model
//! would allocate from per-client id spaces.
//!
//! [`Change`]: crate::Change
//! [`RepairGraph`]: crate::RepairGraph
use crate::{
    UndoRandomState, create_map,
    repair::{Category, Classify},
};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};
use tracing::trace;

mod change;
mod structure;

pub use change::{ChangeBody, DocChange};

/// Identifies a node of a [`DocumentGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a node, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum NodeKind {
    /// The root. Holds the body, the presentation and comments.
    Document,
    Body,
    Cell,
    TextBody,
    Paragraph,
    Run,
    Drawing,
    Group,
    Table,
    Row,
    Presentation,
    Slide,
    Layout,
    Timing,
    Comment,
}

impl Classify for NodeKind {
    fn category(&self) -> Category {
        match self {
            NodeKind::Document | NodeKind::Presentation => Category::Other,
            NodeKind::Body | NodeKind::Cell | NodeKind::TextBody => Category::Container,
            NodeKind::Paragraph => Category::Paragraph,
            NodeKind::Run => Category::Run,
            NodeKind::Drawing | NodeKind::Group => Category::Drawing,
            NodeKind::Table => Category::Table,
            NodeKind::Row => Category::TableRow,
            NodeKind::Slide => Category::Slide,
            NodeKind::Layout => Category::Layout,
            NodeKind::Timing => Category::Timing,
            NodeKind::Comment => Category::Comment,
        }
    }
}

/// One element of a node's ordered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Item {
    /// An owned child node.
    Node(NodeId),
    /// A non-owning reference, as held by timings.
    Ref(NodeId),
    Text(char),
    /// Terminates a paragraph.
    ParaEnd,
}

impl Item {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Item::Node(id) => Some(*id),
            _ => None,
        }
    }
}

/// Scalar attributes a property change can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Property {
    Bold,
    FontSize,
    /// The layout a slide is based on.
    Layout,
    /// The object a comment is attached to.
    Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Ref(NodeId),
}

impl PropValue {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            PropValue::Ref(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub content: Vec<Item>,
    pub props: BTreeMap<Property, PropValue>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            content: Vec::new(),
            props: BTreeMap::new(),
        }
    }

    /// Owned children, in content order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.content.iter().filter_map(Item::node)
    }
}

/// An arena of [`Node`]s rooted at a [`NodeKind::Document`].
#[derive(Clone, PartialEq)]
pub struct DocumentGraph {
    nodes: HashMap<NodeId, Node, UndoRandomState>,
    root: NodeId,
    next_id: u32,
}

impl Default for DocumentGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sorted: BTreeMap<_, _> = self.nodes.iter().collect();
        f.debug_struct("DocumentGraph")
            .field("root", &self.root)
            .field("nodes", &sorted)
            .finish()
    }
}

impl DocumentGraph {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = create_map();
        nodes.insert(root, Node::new(NodeKind::Document));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|node| node.kind)
    }

    pub fn content(&self, id: NodeId) -> &[Item] {
        self.node(id).map_or(&[], |node| &node.content)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn prop(&self, id: NodeId, property: Property) -> Option<PropValue> {
        self.node(id)
            .and_then(|node| node.props.get(&property))
            .copied()
    }

    /// All node ids in the arena, attached or not, ascending.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Whether `id` is reachable from the root through owning content.
    pub fn is_alive(&self, id: NodeId) -> bool {
        let mut current = id;
        // a well-formed tree is never deeper than the arena is large
        for _ in 0..=self.nodes.len() {
            let Some(node) = self.node(current) else {
                return false;
            };
            if current == self.root {
                return true;
            }
            let Some(parent) = node.parent else {
                return false;
            };
            if !self.content(parent).contains(&Item::Node(current)) {
                return false;
            }
            current = parent;
        }
        false
    }

    /// The text of `id` and everything it owns, in document order.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, 0);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String, depth: usize) {
        if depth > self.nodes.len() {
            return;
        }
        for item in self.content(id) {
            match item {
                Item::Text(c) => out.push(*c),
                Item::Node(child) => self.collect_text(*child, out, depth + 1),
                Item::Ref(_) | Item::ParaEnd => {}
            }
        }
    }

    /// Replays `change` into the document.
    pub fn apply(&mut self, change: &DocChange) {
        crate::Change::redo(change, self)
    }

    /// A change removing whatever currently sits at `index` of `target`.
    pub fn removal(&self, target: NodeId, index: usize) -> Option<DocChange> {
        let item = *self.content(target).get(index)?;
        Some(DocChange::remove(target, index, item))
    }

    /// A change setting `property` of `target`, recording the current value as the old one.
    pub fn property_change(
        &self,
        target: NodeId,
        property: Property,
        value: Option<PropValue>,
    ) -> DocChange {
        DocChange::property(target, property, self.prop(target, property), value)
    }

    /// The id the next created node will get.
    pub fn fresh_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    /// Creates a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(kind));
        id
    }

    /// Appends `child` to the content of `parent`, in front of a trailing paragraph end marker.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let content = self.content(parent);
        let index = match content.last() {
            Some(Item::ParaEnd) => content.len() - 1,
            _ => content.len(),
        };
        self.insert_item(parent, index, Item::Node(child));
    }

    /// Creates a node of `kind` and appends it to `parent`.
    pub fn add(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.create(kind);
        self.append_child(parent, id);
        id
    }

    /// The document body, created on first use.
    pub fn body(&mut self) -> NodeId {
        self.find_or_add_top_level(NodeKind::Body)
    }

    /// The presentation, created on first use.
    pub fn presentation(&mut self) -> NodeId {
        self.find_or_add_top_level(NodeKind::Presentation)
    }

    fn find_or_add_top_level(&mut self, kind: NodeKind) -> NodeId {
        let existing = self
            .content(self.root)
            .iter()
            .filter_map(Item::node)
            .find(|id| self.kind(*id) == Some(kind));
        match existing {
            Some(id) => id,
            None => self.add(self.root, kind),
        }
    }

    /// Appends a paragraph holding one run of `text` to `container`.
    ///
    /// Returns the paragraph and the run.
    pub fn paragraph(&mut self, container: NodeId, text: &str) -> (NodeId, NodeId) {
        let paragraph = self.add(container, NodeKind::Paragraph);
        self.push_item(paragraph, Item::ParaEnd);
        let run = self.add(paragraph, NodeKind::Run);
        for c in text.chars() {
            self.push_item(run, Item::Text(c));
        }
        (paragraph, run)
    }

    /// Appends a paragraph with one run of `text` to the body and returns the run.
    pub fn text_run(&mut self, text: &str) -> NodeId {
        let body = self.body();
        self.paragraph(body, text).1
    }

    /// Appends a `rows` x `cols` table of empty cells to `container`.
    pub fn table(&mut self, container: NodeId, rows: usize, cols: usize) -> NodeId {
        let table = self.add(container, NodeKind::Table);
        for _ in 0..rows {
            let row = self.add(table, NodeKind::Row);
            for _ in 0..cols {
                let cell = self.add(row, NodeKind::Cell);
                self.paragraph(cell, "");
            }
        }
        table
    }

    /// Appends a slide to the presentation, based on `layout` if given.
    pub fn slide(&mut self, layout: Option<NodeId>) -> NodeId {
        let presentation = self.presentation();
        let slide = self.add(presentation, NodeKind::Slide);
        if let Some(layout) = layout {
            self.set_prop(slide, Property::Layout, Some(PropValue::Ref(layout)));
        }
        slide
    }

    pub fn layout(&mut self) -> NodeId {
        let presentation = self.presentation();
        self.add(presentation, NodeKind::Layout)
    }

    /// Appends a timing animating `targets` to `slide`.
    pub fn timing(&mut self, slide: NodeId, targets: &[NodeId]) -> NodeId {
        let timing = self.add(slide, NodeKind::Timing);
        for target in targets {
            self.push_item(timing, Item::Ref(*target));
        }
        timing
    }

    /// Adds a comment on `anchor`.
    pub fn comment(&mut self, anchor: NodeId) -> NodeId {
        let comment = self.add(self.root, NodeKind::Comment);
        self.set_prop(comment, Property::Anchor, Some(PropValue::Ref(anchor)));
        comment
    }

    fn push_item(&mut self, target: NodeId, item: Item) {
        let len = self.content(target).len();
        self.insert_item(target, len, item);
    }

    /// Adds node `id` of `kind` unless it exists. Later ids are allocated past it.
    pub(crate) fn ensure_node(&mut self, id: NodeId, kind: NodeKind) {
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        self.nodes.entry(id).or_insert_with(|| Node::new(kind));
    }

    /// Inserts `item` at `index` of `target`, clamping past-the-end positions.
    ///
    /// An inserted node is re-parented to `target`.
    pub(crate) fn insert_item(&mut self, target: NodeId, index: usize, item: Item) {
        let Some(node) = self.nodes.get_mut(&target) else {
            trace!(%target, "insertion into unknown node ignored");
            return;
        };
        let index = index.min(node.content.len());
        node.content.insert(index, item);
        if let Item::Node(child) = item {
            if let Some(child) = self.nodes.get_mut(&child) {
                child.parent = Some(target);
            }
        }
    }

    /// Removes the item at `index` of `target`. Out-of-range removals are ignored.
    ///
    /// A removed node is detached but stays in the arena.
    pub(crate) fn remove_item(&mut self, target: NodeId, index: usize) -> Option<Item> {
        let node = self.nodes.get_mut(&target)?;
        if index >= node.content.len() {
            trace!(%target, index, "removal past the end ignored");
            return None;
        }
        let item = node.content.remove(index);
        if let Item::Node(child) = item {
            if let Some(child) = self.nodes.get_mut(&child) {
                if child.parent == Some(target) {
                    child.parent = None;
                }
            }
        }
        Some(item)
    }

    pub(crate) fn set_prop(&mut self, target: NodeId, property: Property, value: Option<PropValue>) {
        let Some(node) = self.nodes.get_mut(&target) else {
            return;
        };
        match value {
            Some(value) => node.props.insert(property, value),
            None => node.props.remove(&property),
        };
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }
}

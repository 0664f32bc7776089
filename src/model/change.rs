// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{DocumentGraph, Item, NodeId, NodeKind, PropValue, Property};
use crate::change::{Affected, Change, ChangeKind, SimpleAction};
use smallvec::smallvec;

/// What a [`DocChange`] does to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum ChangeBody {
    /// Opens a Point. Does nothing to the document.
    Description(String),
    /// Inserts and removes items of the target's content, in order.
    Content(Vec<SimpleAction<Item>>),
    /// Sets one property of the target from `before` to `after`. `None` means unset.
    Property {
        property: Property,
        before: Option<PropValue>,
        after: Option<PropValue>,
    },
    /// Adds the target to the arena, detached. Has no inverse: a detached node is inert.
    Create(NodeKind),
}

/// An edit of a [`DocumentGraph`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct DocChange {
    pub target: NodeId,
    pub body: ChangeBody,
    pub reverted: bool,
}

impl DocChange {
    pub fn content(target: NodeId, actions: Vec<SimpleAction<Item>>) -> Self {
        Self {
            target,
            body: ChangeBody::Content(actions),
            reverted: false,
        }
    }

    pub fn insert(target: NodeId, index: usize, item: Item) -> Self {
        Self::content(target, vec![SimpleAction::insert(index, item)])
    }

    pub fn remove(target: NodeId, index: usize, item: Item) -> Self {
        Self::content(target, vec![SimpleAction::remove(index, item)])
    }

    pub fn property(
        target: NodeId,
        property: Property,
        before: Option<PropValue>,
        after: Option<PropValue>,
    ) -> Self {
        Self {
            target,
            body: ChangeBody::Property {
                property,
                before,
                after,
            },
            reverted: false,
        }
    }

    pub fn create(target: NodeId, kind: NodeKind) -> Self {
        Self {
            target,
            body: ChangeBody::Create(kind),
            reverted: false,
        }
    }

    /// A Point boundary labelled `label`, targeting the document root.
    pub fn description(label: &str) -> Self {
        Self {
            target: NodeId(0),
            body: ChangeBody::Description(label.to_owned()),
            reverted: false,
        }
    }

    fn apply_action(&self, doc: &mut DocumentGraph, action: &SimpleAction<Item>) {
        if action.is_insertion {
            doc.insert_item(self.target, action.index, action.payload);
        } else {
            doc.remove_item(self.target, action.index);
        }
    }
}

impl Change for DocChange {
    type Document = DocumentGraph;
    type Target = NodeId;
    type Item = Item;

    fn kind(&self) -> ChangeKind {
        match self.body {
            ChangeBody::Content(_) => ChangeKind::Content,
            ChangeBody::Description(_) | ChangeBody::Property { .. } | ChangeBody::Create(_) => {
                ChangeKind::Property
            }
        }
    }

    fn is_description_change(&self) -> bool {
        matches!(self.body, ChangeBody::Description(_))
    }

    fn to_simple_changes(&self) -> Vec<Self> {
        match &self.body {
            ChangeBody::Content(actions) => actions
                .iter()
                .map(|action| Self {
                    target: self.target,
                    body: ChangeBody::Content(vec![action.clone()]),
                    reverted: self.reverted,
                })
                .collect(),
            _ => vec![self.clone()],
        }
    }

    fn to_simple_actions(&self) -> Vec<SimpleAction<Item>> {
        match &self.body {
            ChangeBody::Content(actions) => actions.clone(),
            _ => Vec::new(),
        }
    }

    fn from_simple_actions(&mut self, actions: Vec<SimpleAction<Item>>) {
        if let ChangeBody::Content(current) = &mut self.body {
            *current = actions;
        }
    }

    fn target(&self) -> NodeId {
        self.target
    }

    fn is_reverted(&self) -> bool {
        self.reverted
    }

    fn set_reverted(&mut self, reverted: bool) {
        self.reverted = reverted;
    }

    fn create_reverse_change(&self) -> Option<Self> {
        let body = match &self.body {
            ChangeBody::Description(_) | ChangeBody::Create(_) => return None,
            ChangeBody::Content(actions) => ChangeBody::Content(
                actions
                    .iter()
                    .rev()
                    .cloned()
                    .map(SimpleAction::inverted)
                    .collect(),
            ),
            ChangeBody::Property {
                property,
                before,
                after,
            } => ChangeBody::Property {
                property: *property,
                before: *after,
                after: *before,
            },
        };
        Some(Self {
            target: self.target,
            body,
            reverted: false,
        })
    }

    fn undo(&self, doc: &mut DocumentGraph) {
        match &self.body {
            ChangeBody::Description(_) | ChangeBody::Create(_) => {}
            ChangeBody::Content(actions) => {
                for action in actions.iter().rev() {
                    self.apply_action(doc, &action.clone().inverted());
                }
            }
            ChangeBody::Property {
                property, before, ..
            } => doc.set_prop(self.target, *property, *before),
        }
    }

    fn redo(&self, doc: &mut DocumentGraph) {
        match &self.body {
            ChangeBody::Description(_) => {}
            ChangeBody::Content(actions) => {
                for action in actions {
                    self.apply_action(doc, action);
                }
            }
            ChangeBody::Property {
                property, after, ..
            } => doc.set_prop(self.target, *property, *after),
            ChangeBody::Create(kind) => doc.ensure_node(self.target, *kind),
        }
    }

    /// A property change can be undone while its target is alive and the value it would restore
    /// does not point at a dead object.
    fn check_validity(&self, doc: &DocumentGraph) -> bool {
        match &self.body {
            ChangeBody::Property { before, .. } => {
                doc.is_alive(self.target)
                    && before
                        .and_then(|value| value.node())
                        .is_none_or(|node| doc.is_alive(node))
            }
            _ => true,
        }
    }

    fn element_count(&self) -> usize {
        match &self.body {
            ChangeBody::Description(_) => 0,
            ChangeBody::Content(actions) => actions.len(),
            ChangeBody::Property { .. } | ChangeBody::Create(_) => 1,
        }
    }

    fn affected(&self) -> Affected<NodeId> {
        let mut affected: Affected<NodeId> = smallvec![self.target];
        match &self.body {
            ChangeBody::Description(_) | ChangeBody::Create(_) => {}
            ChangeBody::Content(actions) => {
                affected.extend(actions.iter().filter_map(|action| match action.payload {
                    Item::Node(id) | Item::Ref(id) => Some(id),
                    Item::Text(_) | Item::ParaEnd => None,
                }));
            }
            ChangeBody::Property { before, after, .. } => {
                affected.extend(before.iter().chain(after).filter_map(PropValue::node));
            }
        }
        affected
    }

    fn point_boundary() -> Option<Self> {
        Some(Self::description("local undo"))
    }
}

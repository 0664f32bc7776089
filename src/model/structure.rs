// (c) Copyright 2025 Helsing GmbH. All rights reserved.
use super::{DocChange, DocumentGraph, Item, NodeId, NodeKind, Property};
use crate::{
    change::{Change, SimpleAction},
    repair::{Category, Classify, RepairGraph},
};

impl DocumentGraph {
    fn owns(&self, parent: NodeId, child: NodeId) -> bool {
        self.node(child).is_some_and(|node| node.parent == Some(parent))
    }

    /// One change removing every occurrence of `item` from `target`, last first.
    fn removal_of_all(&self, target: NodeId, item: Item) -> Option<DocChange> {
        let actions: Vec<_> = self
            .content(target)
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, candidate)| **candidate == item)
            .map(|(index, _)| SimpleAction::remove(index, item))
            .collect();
        (!actions.is_empty()).then(|| DocChange::content(target, actions))
    }

    fn perform(&mut self, changes: Vec<DocChange>) -> Vec<DocChange> {
        for change in &changes {
            self.apply(change);
        }
        changes
    }

    fn kind_is(&self, id: Option<NodeId>, kinds: &[NodeKind]) -> bool {
        id.and_then(|id| self.kind(id))
            .is_some_and(|kind| kinds.contains(&kind))
    }
}

impl RepairGraph for DocumentGraph {
    type Id = NodeId;
    type Edit = DocChange;

    fn category(&self, id: NodeId) -> Option<Category> {
        self.kind(id).map(|kind| kind.category())
    }

    fn is_alive(&self, id: NodeId) -> bool {
        DocumentGraph::is_alive(self, id)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        DocumentGraph::parent(self, id)
    }

    /// Owned children. Stale listings of nodes owned elsewhere are skipped.
    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.content(id)
            .iter()
            .filter_map(Item::node)
            .filter(|child| self.owns(id, *child))
            .collect()
    }

    fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        let mut dependents: Vec<_> = self
            .nodes()
            .filter(|(holder, node)| {
                let references = node.content.contains(&Item::Ref(id))
                    || node.props.values().any(|value| value.node() == Some(id));
                let stale = node.content.contains(&Item::Node(id))
                    && self.parent(id) != Some(*holder);
                references || stale
            })
            .map(|(holder, _)| holder)
            .collect();
        dependents.sort_unstable();
        dependents
    }

    /// Detaches `id` from its parent. The node stays in the arena, unreachable.
    fn mark_deleted(&mut self, id: NodeId) -> Vec<DocChange> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let removal = self.removal_of_all(parent, Item::Node(id));
        self.perform(removal.into_iter().collect())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Vec<DocChange> {
        let removal = self.removal_of_all(parent, Item::Node(child));
        self.perform(removal.into_iter().collect())
    }

    fn slide_layout(&self, slide: NodeId) -> Option<NodeId> {
        self.prop(slide, Property::Layout)?.node()
    }

    /// A drawing must sit on a slide, in a run or in a group. A group must also hold at least
    /// one drawing.
    fn is_structurally_valid(&self, drawing: NodeId) -> bool {
        let placed = self.kind_is(
            self.parent(drawing),
            &[NodeKind::Slide, NodeKind::Run, NodeKind::Group],
        );
        match self.kind(drawing) {
            Some(NodeKind::Group) => {
                placed
                    && self.children(drawing).into_iter().any(|child| {
                        self.kind_is(Some(child), &[NodeKind::Drawing, NodeKind::Group])
                    })
            }
            Some(NodeKind::Drawing) => placed,
            _ => true,
        }
    }

    fn anchored_drawings(&self, run: NodeId) -> Vec<NodeId> {
        self.content(run)
            .iter()
            .filter_map(Item::node)
            .filter(|id| self.category(*id) == Some(Category::Drawing))
            .collect()
    }

    /// Tables without rows and paragraphs without anything, not even an end marker.
    fn is_empty_block(&self, block: NodeId) -> bool {
        match self.kind(block) {
            Some(NodeKind::Table) => self.children(block).is_empty(),
            Some(NodeKind::Paragraph) => self.content(block).is_empty(),
            _ => false,
        }
    }

    fn ends_with_paragraph(&self, container: NodeId) -> bool {
        let last = self.children(container).last().copied();
        self.kind_is(last, &[NodeKind::Paragraph])
    }

    fn append_empty_paragraph(&mut self, container: NodeId) -> Option<(NodeId, Vec<DocChange>)> {
        self.node(container)?;
        let paragraph = self.fresh_id();
        let len = self.content(container).len();
        let edits = self.perform(vec![
            DocChange::create(paragraph, NodeKind::Paragraph),
            DocChange::insert(paragraph, 0, Item::ParaEnd),
            DocChange::insert(container, len, Item::Node(paragraph)),
        ]);
        Some((paragraph, edits))
    }

    fn normalize_paragraph(&mut self, paragraph: NodeId) -> Vec<DocChange> {
        let content = self.content(paragraph);
        let markers = content.iter().filter(|item| **item == Item::ParaEnd).count();
        if self.node(paragraph).is_none()
            || (markers == 1 && content.last() == Some(&Item::ParaEnd))
        {
            return Vec::new();
        }
        let end = content.len() - markers;
        let mut actions: Vec<_> = self
            .removal_of_all(paragraph, Item::ParaEnd)
            .map(|removal| removal.to_simple_actions())
            .unwrap_or_default();
        actions.push(SimpleAction::insert(end, Item::ParaEnd));
        self.perform(vec![DocChange::content(paragraph, actions)])
    }

    fn timing_targets(&self, timing: NodeId) -> Vec<NodeId> {
        self.content(timing)
            .iter()
            .filter_map(|item| match item {
                Item::Ref(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn remove_timing_target(&mut self, timing: NodeId, target: NodeId) -> Vec<DocChange> {
        let removal = self.removal_of_all(timing, Item::Ref(target));
        self.perform(removal.into_iter().collect())
    }

    fn comment_anchor(&self, comment: NodeId) -> Option<NodeId> {
        self.prop(comment, Property::Anchor)?.node()
    }
}

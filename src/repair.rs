// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # Consistency Repair
//!
//! Replaying rebased inverses can leave the document graph in shapes no editor would ever produce
//! on its own: a body with no paragraph left, a paragraph that lost its end marker, a run still
//! listing a drawing that moved elsewhere, a table row without cells, a slide whose layout is
//! gone, an animation or comment pointing at a removed object.
//!
//! [`repair`] restores those invariants for the objects an undo touched. Objects are sorted by
//! their [`Category`] and handled one category at a time, in dependency order:
//!
//! 1. layouts and slides: a slide whose layout is gone is removed;
//! 2. drawings: structurally invalid drawings (and emptied groups) are detached;
//! 3. runs: anchors of drawings that are gone or owned elsewhere are stripped;
//! 4. table rows and tables: rows without cells are dropped;
//! 5. containers: empty blocks are dropped and a trailing paragraph is guaranteed;
//! 6. paragraphs: orphans are removed and end markers normalised;
//! 7. timings: references to removed targets are dropped;
//! 8. comments: comments whose anchor is gone are removed.
//!
//! A fix can make more work for an earlier category (an emptied table dirties its container, a
//! removed object dirties whatever references it), so the pass always resumes at the earliest
//! category with pending work. Whenever an object is found dead, everything that depends on it or
//! on anything it owns is queued as well.
//!
//! The pass never fails. What cannot be put right is taken out of the document. Running it again
//! over the same objects finds nothing to do.
//!
//! Every fix is made through the graph's own edit records, which the pass collects in order in
//! [`RepairReport::changes`]. Collaborators never run the pass on what they receive: they replay
//! those edits, so their documents come out the same.
use std::{collections::BTreeSet, fmt, hash::Hash};
use tracing::debug;

/// Structural role of a document object, as far as repair is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum Category {
    /// Holds blocks (paragraphs and tables) and must end with a paragraph.
    Container,
    Paragraph,
    Run,
    /// Drawings, shapes and groups of them.
    Drawing,
    Table,
    TableRow,
    Slide,
    Layout,
    Timing,
    Comment,
    /// Anything repair has no rule for.
    Other,
}

/// Implemented by every node type of a document model.
pub trait Classify {
    fn category(&self) -> Category;
}

/// The view of a document graph the repair pass reads and fixes.
///
/// Ids of objects the graph does not know must be tolerated everywhere: queries answer with
/// nothing and fixes do nothing.
///
/// Every fix is applied right away and returns the edits it was made of, in application order.
/// Replaying them on a copy of the graph from before the fix must give the same graph.
pub trait RepairGraph {
    type Id: Copy + Ord + Hash + fmt::Debug;

    /// The edit record fixes are expressed in.
    type Edit;

    fn category(&self, id: Self::Id) -> Option<Category>;

    /// Whether `id` is attached to the document and not deleted.
    fn is_alive(&self, id: Self::Id) -> bool;

    fn parent(&self, id: Self::Id) -> Option<Self::Id>;

    /// Children owned by `id`, in order.
    fn children(&self, id: Self::Id) -> Vec<Self::Id>;

    /// Objects holding a reference to `id` without owning it.
    fn dependents(&self, id: Self::Id) -> Vec<Self::Id>;

    /// Takes `id` out of the document.
    fn mark_deleted(&mut self, id: Self::Id) -> Vec<Self::Edit>;

    /// Detaches `child` from `parent`, dropping any listing of it there.
    fn remove_child(&mut self, parent: Self::Id, child: Self::Id) -> Vec<Self::Edit>;

    fn slide_layout(&self, slide: Self::Id) -> Option<Self::Id>;

    fn is_structurally_valid(&self, drawing: Self::Id) -> bool;

    /// Drawings listed in the content of `run`, whoever owns them.
    fn anchored_drawings(&self, run: Self::Id) -> Vec<Self::Id>;

    /// Whether `block` is a stub that a container should not keep.
    fn is_empty_block(&self, block: Self::Id) -> bool;

    fn ends_with_paragraph(&self, container: Self::Id) -> bool;

    /// Returns `None` if the container cannot hold a paragraph.
    fn append_empty_paragraph(
        &mut self,
        container: Self::Id,
    ) -> Option<(Self::Id, Vec<Self::Edit>)>;

    /// Ensures `paragraph` has exactly one end marker, at the end. Empty if nothing changed.
    fn normalize_paragraph(&mut self, paragraph: Self::Id) -> Vec<Self::Edit>;

    fn timing_targets(&self, timing: Self::Id) -> Vec<Self::Id>;

    fn remove_timing_target(&mut self, timing: Self::Id, target: Self::Id) -> Vec<Self::Edit>;

    fn comment_anchor(&self, comment: Self::Id) -> Option<Self::Id>;
}

/// One fix performed by [`repair`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub enum RepairAction<Id> {
    RemovedSlide(Id),
    RemovedDrawing(Id),
    StrippedAnchor { run: Id, drawing: Id },
    DroppedRow { table: Id, row: Id },
    DroppedBlock { container: Id, block: Id },
    SynthesizedParagraph { container: Id, paragraph: Id },
    FixedParagraph(Id),
    /// An object with no valid place in the document, taken out of it.
    RemovedOrphan(Id),
    DroppedTimingTarget { timing: Id, target: Id },
    RemovedComment(Id),
}

/// Every fix a [`repair`] run performed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
pub struct RepairReport<Id, E> {
    pub actions: Vec<RepairAction<Id>>,
    /// The edits the fixes were made of, in the order they were applied.
    pub changes: Vec<E>,
}

impl<Id, E> Default for RepairReport<Id, E> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            changes: Vec::new(),
        }
    }
}

impl<Id, E> RepairReport<Id, E> {
    /// True if the graph needed no fix.
    pub fn is_clean(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Pending work, one queue per category.
struct Buckets<Id> {
    layouts: BTreeSet<Id>,
    slides: BTreeSet<Id>,
    drawings: BTreeSet<Id>,
    runs: BTreeSet<Id>,
    rows: BTreeSet<Id>,
    tables: BTreeSet<Id>,
    containers: BTreeSet<Id>,
    paragraphs: BTreeSet<Id>,
    timings: BTreeSet<Id>,
    comments: BTreeSet<Id>,
}

impl<Id: Ord> Default for Buckets<Id> {
    fn default() -> Self {
        Self {
            layouts: BTreeSet::new(),
            slides: BTreeSet::new(),
            drawings: BTreeSet::new(),
            runs: BTreeSet::new(),
            rows: BTreeSet::new(),
            tables: BTreeSet::new(),
            containers: BTreeSet::new(),
            paragraphs: BTreeSet::new(),
            timings: BTreeSet::new(),
            comments: BTreeSet::new(),
        }
    }
}

impl<Id: Ord> Buckets<Id> {
    /// Objects repair has no rule for are not queued.
    fn push(&mut self, category: Category, id: Id) {
        let bucket = match category {
            Category::Layout => &mut self.layouts,
            Category::Slide => &mut self.slides,
            Category::Drawing => &mut self.drawings,
            Category::Run => &mut self.runs,
            Category::TableRow => &mut self.rows,
            Category::Table => &mut self.tables,
            Category::Container => &mut self.containers,
            Category::Paragraph => &mut self.paragraphs,
            Category::Timing => &mut self.timings,
            Category::Comment => &mut self.comments,
            Category::Other => return,
        };
        bucket.insert(id);
    }

    /// The next object to look at, earliest category first.
    fn pop(&mut self) -> Option<(Category, Id)> {
        [
            (Category::Layout, &mut self.layouts),
            (Category::Slide, &mut self.slides),
            (Category::Drawing, &mut self.drawings),
            (Category::Run, &mut self.runs),
            (Category::TableRow, &mut self.rows),
            (Category::Table, &mut self.tables),
            (Category::Container, &mut self.containers),
            (Category::Paragraph, &mut self.paragraphs),
            (Category::Timing, &mut self.timings),
            (Category::Comment, &mut self.comments),
        ]
        .into_iter()
        .find_map(|(category, bucket)| bucket.pop_first().map(|id| (category, id)))
    }
}

struct Pass<'g, G: RepairGraph> {
    graph: &'g mut G,
    pending: Buckets<G::Id>,
    /// Dead objects whose dependents were already queued.
    expanded: BTreeSet<G::Id>,
    report: RepairReport<G::Id, G::Edit>,
}

/// Restores the structural invariants of `graph` around the objects in `touched`.
///
/// Unknown or already repaired objects are fine. The returned report is empty if nothing needed
/// fixing.
pub fn repair<G: RepairGraph>(
    graph: &mut G,
    touched: impl IntoIterator<Item = G::Id>,
) -> RepairReport<G::Id, G::Edit> {
    let mut pass = Pass {
        graph,
        pending: Buckets::default(),
        expanded: BTreeSet::new(),
        report: RepairReport::default(),
    };
    for id in touched {
        pass.enqueue(id);
    }
    while let Some((category, id)) = pass.pending.pop() {
        if !pass.graph.is_alive(id) {
            pass.expand(id);
            continue;
        }
        match category {
            Category::Layout => {}
            Category::Slide => pass.slide(id),
            Category::Drawing => pass.drawing(id),
            Category::Run => pass.run(id),
            Category::TableRow => pass.row(id),
            Category::Table => pass.table(id),
            Category::Container => pass.container(id),
            Category::Paragraph => pass.paragraph(id),
            Category::Timing => pass.timing(id),
            Category::Comment => pass.comment(id),
            Category::Other => {}
        }
    }
    pass.report
}

impl<G: RepairGraph> Pass<'_, G> {
    fn enqueue(&mut self, id: G::Id) {
        if let Some(category) = self.graph.category(id) {
            self.pending.push(category, id);
        }
    }

    fn record(&mut self, category: Category, action: RepairAction<G::Id>, edits: Vec<G::Edit>) {
        debug!(?category, ?action, edits = edits.len(), "repaired");
        self.report.actions.push(action);
        self.report.changes.extend(edits);
    }

    /// Takes `id` out of the document and queues whatever it leaves behind.
    fn discard(&mut self, category: Category, id: G::Id, action: RepairAction<G::Id>) {
        let parent = self.graph.parent(id);
        let edits = self.graph.mark_deleted(id);
        self.record(category, action, edits);
        self.expand(id);
        if let Some(parent) = parent {
            self.enqueue(parent);
        }
    }

    /// Queues whatever references `id` or anything it owns.
    fn expand(&mut self, id: G::Id) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !self.expanded.insert(next) {
                continue;
            }
            for dependent in self.graph.dependents(next) {
                self.enqueue(dependent);
            }
            stack.extend(self.graph.children(next));
        }
    }

    fn slide(&mut self, slide: G::Id) {
        let Some(layout) = self.graph.slide_layout(slide) else {
            return;
        };
        if !self.graph.is_alive(layout) {
            self.discard(Category::Slide, slide, RepairAction::RemovedSlide(slide));
        }
    }

    fn drawing(&mut self, drawing: G::Id) {
        // runs still listing a drawing that moved need a look even if the drawing is fine
        for dependent in self.graph.dependents(drawing) {
            self.enqueue(dependent);
        }
        if self.graph.is_structurally_valid(drawing) {
            return;
        }
        // alive, so there is a parent listing it
        if let Some(parent) = self.graph.parent(drawing) {
            let edits = self.graph.remove_child(parent, drawing);
            self.record(Category::Drawing, RepairAction::RemovedDrawing(drawing), edits);
            self.enqueue(parent);
            self.expand(drawing);
        }
    }

    fn run(&mut self, run: G::Id) {
        for drawing in self.graph.anchored_drawings(run) {
            let owned_here = self.graph.parent(drawing) == Some(run);
            if owned_here && self.graph.is_alive(drawing) {
                continue;
            }
            let edits = self.graph.remove_child(run, drawing);
            self.record(
                Category::Run,
                RepairAction::StrippedAnchor { run, drawing },
                edits,
            );
        }
    }

    fn row(&mut self, row: G::Id) {
        if let Some(table) = self.graph.parent(row) {
            self.enqueue(table);
        }
    }

    fn table(&mut self, table: G::Id) {
        let Some(parent) = self.graph.parent(table) else {
            return;
        };
        if self.graph.category(parent) != Some(Category::Container) {
            self.discard(Category::Table, table, RepairAction::RemovedOrphan(table));
            return;
        }
        for row in self.graph.children(table) {
            if self.graph.children(row).is_empty() {
                let edits = self.graph.remove_child(table, row);
                self.record(Category::Table, RepairAction::DroppedRow { table, row }, edits);
                self.expand(row);
            }
        }
        if self.graph.children(table).is_empty() {
            self.enqueue(parent);
        }
    }

    fn container(&mut self, container: G::Id) {
        for block in self.graph.children(container) {
            if self.graph.is_empty_block(block) {
                let edits = self.graph.remove_child(container, block);
                self.record(
                    Category::Container,
                    RepairAction::DroppedBlock { container, block },
                    edits,
                );
                self.expand(block);
            }
        }
        if self.graph.ends_with_paragraph(container) {
            return;
        }
        match self.graph.append_empty_paragraph(container) {
            Some((paragraph, edits)) => self.record(
                Category::Container,
                RepairAction::SynthesizedParagraph {
                    container,
                    paragraph,
                },
                edits,
            ),
            None => self.discard(
                Category::Container,
                container,
                RepairAction::RemovedOrphan(container),
            ),
        }
    }

    fn paragraph(&mut self, paragraph: G::Id) {
        let parent = self.graph.parent(paragraph);
        let in_container = parent.and_then(|p| self.graph.category(p)) == Some(Category::Container);
        if !in_container {
            self.discard(
                Category::Paragraph,
                paragraph,
                RepairAction::RemovedOrphan(paragraph),
            );
            return;
        }
        let edits = self.graph.normalize_paragraph(paragraph);
        if !edits.is_empty() {
            self.record(
                Category::Paragraph,
                RepairAction::FixedParagraph(paragraph),
                edits,
            );
        }
    }

    fn timing(&mut self, timing: G::Id) {
        for target in self.graph.timing_targets(timing) {
            if !self.graph.is_alive(target) {
                let edits = self.graph.remove_timing_target(timing, target);
                self.record(
                    Category::Timing,
                    RepairAction::DroppedTimingTarget { timing, target },
                    edits,
                );
            }
        }
    }

    fn comment(&mut self, comment: G::Id) {
        let anchored = self
            .graph
            .comment_anchor(comment)
            .is_some_and(|anchor| self.graph.is_alive(anchor));
        if !anchored {
            self.discard(
                Category::Comment,
                comment,
                RepairAction::RemovedComment(comment),
            );
        }
    }
}

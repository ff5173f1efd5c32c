use crate::pane::{DockEdge, Pane, PaneId, PaneState};

use super::{CompositionNode, CompositionTree, NodeId, Split, SplitChild};

/// Where [`CompositionTree::auto_insert`] put a pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoPlacement {
    /// The pane it was docked against, or `None` if it became the root.
    pub relative: Option<PaneId>,
    pub edge: DockEdge,
}

impl<C> CompositionTree<C> {
    /// Dock `pane` at the top level of the tree, on `edge`.
    ///
    /// # Panics
    /// If `pane` is already docked in this tree.
    pub fn insert(&mut self, mut pane: Pane<C>, edge: DockEdge) {
        assert!(
            !self.contains(pane.id()),
            "insert: pane {} is already docked",
            pane.id()
        );
        log::debug!("insert pane {} at {edge:?}", pane.id());

        pane.set_dock_edge(edge);
        pane.transition(PaneState::Docked);

        match self.root() {
            None => {
                let root = self.alloc(CompositionNode::Terminal(pane));
                self.set_root(Some(root));
            }
            Some(root) => self.add(root, pane, edge),
        }
    }

    /// Dock `pane` against the already docked `relative` pane, on `edge` of it.
    ///
    /// # Panics
    /// If `pane` is already docked, or `relative` is not.
    pub fn insert_relative(&mut self, mut pane: Pane<C>, relative: PaneId, edge: DockEdge) {
        assert!(
            !self.contains(pane.id()),
            "insert_relative: pane {} is already docked",
            pane.id()
        );
        let Some(target) = self.find(relative) else {
            panic!("insert_relative: relative pane {relative} is not docked");
        };
        log::debug!("insert pane {} at {edge:?} of {relative}", pane.id());

        pane.set_dock_edge(edge);
        pane.transition(PaneState::Docked);

        let sibling_slot = self.parent_of(target).filter(|&(parent, _)| {
            self.split(parent)
                .is_some_and(|split| split.orientation == edge.orientation())
        });

        match sibling_slot {
            // Same axis as the parent: become a sibling right beside the target and share its slot.
            Some((parent, index)) => {
                let new_node = self.alloc(CompositionNode::Terminal(pane));
                let Some(split) = self.split_mut(parent) else {
                    unreachable!("parent_of returned a non-split");
                };
                let target_slot = &mut split.children[index];
                target_slot.factor *= 0.5;
                let factor = target_slot.factor;
                let at = if edge.is_leading() { index } else { index + 1 };
                split.children.insert(at, SplitChild::new(new_node, factor));
                split.clear_extents();
            }
            // Crossing axis (or the target is the root): wrap just the target.
            None => self.add(target, pane, edge),
        }
    }

    /// Dock `pane` against the biggest docked pane.
    ///
    /// The biggest pane is the first one with the largest `width² + height²`. When nothing has
    /// been measured yet the *last* pane in traversal order is used. The new pane goes below a
    /// pane that is at least as tall as it is wide, and to the right otherwise.
    pub fn auto_insert(&mut self, pane: Pane<C>) -> AutoPlacement {
        let Some((target, target_size)) = self.largest_pane() else {
            let edge = pane.dock_edge();
            self.insert(pane, edge);
            return AutoPlacement {
                relative: None,
                edge,
            };
        };

        let edge = if target_size.x <= target_size.y {
            DockEdge::Bottom
        } else {
            DockEdge::Right
        };
        self.insert_relative(pane, target, edge);
        AutoPlacement {
            relative: Some(target),
            edge,
        }
    }

    fn largest_pane(&self) -> Option<(PaneId, egui::Vec2)> {
        let mut largest: Option<&Pane<C>> = None;
        let mut last = None;
        for pane in self.panes() {
            if pane.hypot_squared() > largest.map_or(0.0, Pane::hypot_squared) {
                largest = Some(pane);
            }
            last = Some(pane);
        }
        largest.or(last).map(|p| (p.id(), p.size))
    }

    /// Attach a new terminal for `pane` at `node`, restructuring `node` as needed.
    fn add(&mut self, node: NodeId, pane: Pane<C>, edge: DockEdge) {
        let orientation = edge.orientation();
        let joins_existing_split = self
            .split(node)
            .is_some_and(|split| split.orientation == orientation);

        let new_node = self.alloc(CompositionNode::Terminal(pane));

        if joins_existing_split {
            let Some(split) = self.split_mut(node) else {
                unreachable!("checked above");
            };
            for child in &mut split.children {
                child.factor *= 0.5;
            }
            let child = SplitChild::new(new_node, 0.5);
            if edge.is_leading() {
                split.children.insert(0, child);
            } else {
                split.children.push(child);
            }
            split.clear_extents();
            return;
        }

        // Terminal, or a split on the other axis: push the old contents one level down.
        let size = self.get(node).map(CompositionNode::size).unwrap_or_default();
        let old = self.replace(
            node,
            CompositionNode::Split(Split::new(orientation, Vec::new(), size)),
        );
        let moved = self.alloc(old);
        let (first, second) = if edge.is_leading() {
            (new_node, moved)
        } else {
            (moved, new_node)
        };
        if let Some(split) = self.split_mut(node) {
            split.children = vec![SplitChild::new(first, 0.5), SplitChild::new(second, 0.5)];
        }
        log::trace!("wrapped {node:?} into a {orientation:?} split");
    }
}

use crate::pane::{Pane, PaneId};

use super::{CompositionNode, CompositionTree, NodeId, SplitChild, FACTOR_EPSILON};

impl<C> CompositionTree<C> {
    /// Take `pane` out of the tree and hand it back to the caller.
    ///
    /// Removing always changes the structure. The freed share goes to the remaining siblings
    /// in proportion to their factors, a split left with one child collapses into that child,
    /// and nested splits of the same orientation are flattened.
    ///
    /// The returned pane is still marked docked; the caller decides where it goes next.
    ///
    /// # Panics
    /// If `pane` is not docked in this tree.
    pub fn remove(&mut self, pane: PaneId) -> Pane<C> {
        let Some(node) = self.find(pane) else {
            panic!("remove: pane {pane} is not docked");
        };
        log::debug!("remove pane {pane}");

        let Some((parent, index)) = self.parent_of(node) else {
            // The terminal was the root.
            self.set_root(None);
            return into_pane(self.take(node));
        };

        let remaining = {
            let Some(split) = self.split_mut(parent) else {
                unreachable!("parent_of returned a non-split");
            };
            let freed = split.children.remove(index).factor;
            redistribute_freed_share(&mut split.children, freed);
            split.clear_extents();
            split.children.len()
        };

        let removed = into_pane(self.take(node));

        if remaining == 1 {
            self.collapse(parent);
        }
        self.flatten();
        removed
    }

    /// Replace a single-child split with its only child, keeping the split's address.
    fn collapse(&mut self, split_node: NodeId) {
        let Some(split) = self.split(split_node) else {
            return;
        };
        let &[only] = split.children.as_slice() else {
            return;
        };
        let slot_size = split.size;
        log::debug!("collapse single-child split {split_node:?}");

        let mut promoted = self.take(only.node);
        if slot_size != egui::Vec2::ZERO {
            promoted.set_size(slot_size);
        }
        let _old_split = self.replace(split_node, promoted);
    }

    /// Splice every split that sits directly inside a split of the same orientation into its parent.
    ///
    /// Factors are scaled by the absorbed split's own factor, so relative sizes and the
    /// sum-to-one property are preserved.
    pub(crate) fn flatten(&mut self) {
        if let Some(root) = self.root() {
            self.flatten_from(root);
        }
    }

    fn flatten_from(&mut self, node: NodeId) {
        loop {
            let Some(split) = self.split(node) else {
                return;
            };
            let orientation = split.orientation;
            let nested = split.children.iter().position(|c| {
                self.split(c.node)
                    .is_some_and(|inner| inner.orientation == orientation)
            });
            let Some(index) = nested else {
                break;
            };

            let absorbed = split.children[index];
            let CompositionNode::Split(inner) = self.take(absorbed.node) else {
                unreachable!("checked above");
            };
            log::debug!(
                "flatten {:?} split {:?} into {node:?}",
                orientation,
                absorbed.node
            );
            let spliced = inner
                .children
                .into_iter()
                .map(|c| SplitChild::new(c.node, c.factor * absorbed.factor));
            if let Some(split) = self.split_mut(node) {
                split.children.splice(index..=index, spliced);
                split.clear_extents();
            }
        }

        let children: Vec<NodeId> = self
            .split(node)
            .map(|s| s.children.iter().map(|c| c.node).collect())
            .unwrap_or_default();
        for child in children {
            self.flatten_from(child);
        }
    }

    /// Collapse every single-child split and drop empty ones, then flatten.
    ///
    /// Only needed for trees assembled from outside data (builders, loaded layouts).
    pub(crate) fn canonicalize(&mut self) {
        if let Some(root) = self.root() {
            if !self.prune_empty(root) {
                let _dropped = self.take(root);
                self.set_root(None);
            }
        }
        if let Some(root) = self.root() {
            self.collapse_single_children(root);
        }
        self.flatten();
    }

    /// Returns `false` if `node` ended up with no panes at all.
    fn prune_empty(&mut self, node: NodeId) -> bool {
        let children: Vec<SplitChild> = match self.split(node) {
            Some(split) => split.children.clone(),
            None => return true,
        };
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            if self.prune_empty(child.node) {
                kept.push(child);
            } else {
                let _dropped = self.take(child.node);
            }
        }
        if kept.is_empty() {
            return false;
        }
        let freed: f64 = 1.0 - kept.iter().map(|c| c.factor).sum::<f64>();
        if freed.abs() > FACTOR_EPSILON {
            let sum = 1.0 - freed;
            let count = kept.len() as f64;
            for child in &mut kept {
                child.factor = if sum > FACTOR_EPSILON {
                    child.factor / sum
                } else {
                    1.0 / count
                };
            }
        }
        if let Some(split) = self.split_mut(node) {
            split.children = kept;
        }
        true
    }

    fn collapse_single_children(&mut self, node: NodeId) {
        while self.split(node).is_some_and(|s| s.children.len() == 1) {
            self.collapse(node);
        }
        let children: Vec<NodeId> = self
            .split(node)
            .map(|s| s.children.iter().map(|c| c.node).collect())
            .unwrap_or_default();
        for child in children {
            self.collapse_single_children(child);
        }
    }
}

fn into_pane<C>(node: CompositionNode<C>) -> Pane<C> {
    match node {
        CompositionNode::Terminal(pane) => pane,
        CompositionNode::Split(_) => panic!("composition tree: expected a terminal"),
    }
}

/// Hand `freed` to `children` in proportion to their current factors.
fn redistribute_freed_share(children: &mut [SplitChild], freed: f64) {
    if children.is_empty() {
        return;
    }
    let kept = 1.0 - freed;
    if kept <= FACTOR_EPSILON {
        let equal = 1.0 / children.len() as f64;
        for child in children.iter_mut() {
            child.factor = equal;
        }
        return;
    }
    for child in children.iter_mut() {
        child.factor /= kept;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::super::{Orientation, Split, TreeShape};
    use super::*;
    use crate::pane::{DockEdge, PaneState};

    use Orientation::{Horizontal, Vertical};

    fn id(raw: u64) -> PaneId {
        PaneId::from_u64(raw)
    }

    #[test]
    fn removing_root_empties_tree() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        let removed = tree.remove(id(1));
        assert_eq!(removed.id(), id(1));
        assert_eq!(removed.state(), PaneState::Docked);
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn removing_one_of_two_collapses_to_terminal() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        tree.insert(pane(2), DockEdge::Right);
        let _b = tree.remove(id(2));
        assert_eq!(tree.shape(), Some(t(1)));
        assert_eq!(tree.node_count(), 1);
        assert_tree_ok(&tree);
    }

    #[test]
    fn freed_share_is_redistributed_proportionally() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Right);
        tree.insert(pane(2), DockEdge::Right);
        tree.insert(pane(3), DockEdge::Right);
        // [1: .25, 2: .25, 3: .5]
        let _p = tree.remove(id(1));
        let shape = tree.shape().unwrap();
        assert!(shape.approx_eq(
            &TreeShape::Split(Vertical, vec![(t(2), 1.0 / 3.0), (t(3), 2.0 / 3.0)]),
            1e-9
        ));
        assert_tree_ok(&tree);
    }

    #[test]
    fn collapse_promotes_nested_split_and_flattens() {
        // Vertical[ Horizontal[1, 3], 2 ] -> remove 2 -> Horizontal[1, 3]
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        tree.insert(pane(2), DockEdge::Right);
        tree.insert_relative(pane(3), id(1), DockEdge::Bottom);
        let _p = tree.remove(id(2));
        assert_eq!(
            tree.shape(),
            Some(TreeShape::Split(Horizontal, vec![(t(1), 0.5), (t(3), 0.5)]))
        );
        assert_tree_ok(&tree);
    }

    #[test]
    fn collapse_that_creates_same_orientation_nesting_is_flattened() {
        // Horizontal[ Vertical[ Horizontal[1, 4], 2 ], 3 ]
        // remove 2 -> the Vertical collapses into Horizontal[1, 4], which then sits inside the
        // outer Horizontal and gets spliced in.
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        tree.insert(pane(2), DockEdge::Right);
        tree.insert(pane(3), DockEdge::Bottom);
        tree.insert_relative(pane(4), id(1), DockEdge::Bottom);
        let _p = tree.remove(id(2));
        let shape = tree.shape().unwrap();
        assert!(
            shape.approx_eq(
                &TreeShape::Split(
                    Horizontal,
                    vec![(t(1), 0.25), (t(4), 0.25), (t(3), 0.5)]
                ),
                1e-9
            ),
            "{shape:?}"
        );
        assert_tree_ok(&tree);
    }

    #[test]
    #[should_panic(expected = "is not docked")]
    fn removing_absent_pane_panics() {
        let mut tree: CompositionTree<()> = CompositionTree::empty();
        let _p = tree.remove(id(1));
    }

    #[test]
    fn redistribute_with_nothing_left_splits_equally() {
        let mut children = vec![
            SplitChild::new(NodeId(0), 0.0),
            SplitChild::new(NodeId(1), 0.0),
        ];
        redistribute_freed_share(&mut children, 1.0);
        assert_eq!(children[0].factor, 0.5);
        assert_eq!(children[1].factor, 0.5);
    }

    #[test]
    fn canonicalize_shares_equally_when_only_zero_factors_survive() {
        // Vertical[ 1: 0, 2: 0, Horizontal[]: 1 ]; the empty split takes the whole share with it.
        let mut tree = CompositionTree::empty();
        let a = tree.alloc(CompositionNode::Terminal(docked(pane(1))));
        let b = tree.alloc(CompositionNode::Terminal(docked(pane(2))));
        let empty = tree.alloc(CompositionNode::Split(Split::new(
            Horizontal,
            Vec::new(),
            egui::Vec2::ZERO,
        )));
        let root = tree.alloc(CompositionNode::Split(Split::new(
            Vertical,
            vec![
                SplitChild::new(a, 0.0),
                SplitChild::new(b, 0.0),
                SplitChild::new(empty, 1.0),
            ],
            egui::Vec2::ZERO,
        )));
        tree.set_root(Some(root));

        tree.canonicalize();
        assert_eq!(
            tree.shape(),
            Some(TreeShape::Split(Vertical, vec![(t(1), 0.5), (t(2), 0.5)]))
        );
        assert_eq!(tree.node_count(), 3);
        assert_tree_ok(&tree);
    }

    #[test]
    fn canonicalize_drops_a_tree_without_panes() {
        let mut tree: CompositionTree<()> = CompositionTree::empty();
        let root = tree.alloc(CompositionNode::Split(Split::new(
            Vertical,
            Vec::new(),
            egui::Vec2::ZERO,
        )));
        tree.set_root(Some(root));
        tree.canonicalize();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
    }
}

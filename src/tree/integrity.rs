use ahash::{AHashMap, AHashSet};

use crate::pane::{PaneId, PaneState};

use super::{CompositionNode, CompositionTree, NodeId, FACTOR_EPSILON};

impl<C> CompositionTree<C> {
    /// Human-readable list of everything structurally wrong with the tree.
    ///
    /// Checks arena consistency (dangling, shared and unreachable nodes, duplicate panes),
    /// the split invariants (no single-child splits, no same-orientation nesting, factors in
    /// `(0, 1]` summing to one) and that every terminal's pane is marked docked.
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues: Vec<String> = Vec::new();

        let Some(root) = self.root() else {
            if self.node_count() != 0 {
                issues.push(format!(
                    "integrity: root=None but {} live nodes",
                    self.node_count()
                ));
            }
            return issues;
        };

        if self.get(root).is_none() {
            issues.push(format!("integrity: root {root:?} missing"));
            return issues;
        }

        let mut visited: AHashSet<NodeId> = AHashSet::new();
        let mut parent_of: AHashMap<NodeId, NodeId> = AHashMap::new();
        let mut panes: AHashSet<PaneId> = AHashSet::new();
        let mut stack: Vec<NodeId> = vec![root];

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }

            let Some(contents) = self.get(node) else {
                issues.push(format!("integrity: missing node {node:?} (reachable)"));
                continue;
            };

            let split = match contents {
                CompositionNode::Terminal(pane) => {
                    if !panes.insert(pane.id()) {
                        issues.push(format!("integrity: pane {} docked twice", pane.id()));
                    }
                    if pane.state() != PaneState::Docked {
                        issues.push(format!(
                            "integrity: terminal {node:?} holds pane {} in state {:?}",
                            pane.id(),
                            pane.state()
                        ));
                    }
                    continue;
                }
                CompositionNode::Split(split) => split,
            };

            if split.children.len() < 2 {
                issues.push(format!(
                    "integrity: split {node:?} has {} children",
                    split.children.len()
                ));
            }

            let sum = split.factor_sum();
            if (sum - 1.0).abs() > FACTOR_EPSILON {
                issues.push(format!("integrity: split {node:?} factors sum to {sum}"));
            }

            for child in &split.children {
                if !(child.factor > 0.0 && child.factor <= 1.0 + FACTOR_EPSILON) {
                    issues.push(format!(
                        "integrity: split {node:?} child {:?} has factor {}",
                        child.node, child.factor
                    ));
                }

                let Some(child_contents) = self.get(child.node) else {
                    issues.push(format!(
                        "integrity: split {node:?} references missing child {:?}",
                        child.node
                    ));
                    continue;
                };

                if child_contents
                    .as_split()
                    .is_some_and(|inner| inner.orientation == split.orientation)
                {
                    issues.push(format!(
                        "integrity: split {node:?} directly contains {:?} split {:?}",
                        split.orientation, child.node
                    ));
                }

                if let Some(previous) = parent_of.insert(child.node, node) {
                    issues.push(format!(
                        "integrity: child {:?} has multiple parents {previous:?} and {node:?}",
                        child.node
                    ));
                }

                stack.push(child.node);
            }
        }

        let total = self.node_count();
        if visited.len() != total {
            issues.push(format!(
                "integrity: unreachable nodes {} of {}",
                total.saturating_sub(visited.len()),
                total
            ));
        }

        issues
    }

    /// Children whose factor is under the `min_pane_extent` floor of a split that has room for it.
    pub fn floor_issues(&self, min_pane_extent: f32) -> Vec<String> {
        let mut issues = Vec::new();
        for node in self.node_ids() {
            let Some(split) = self.split(node) else {
                continue;
            };
            let total = f64::from(split.orientation.main_extent(split.size));
            let count = split.children.len() as f64;
            if total <= 0.0 || total < f64::from(min_pane_extent) * count {
                continue;
            }
            let min_factor = f64::from(min_pane_extent) / total;
            for child in &split.children {
                if child.factor < min_factor - FACTOR_EPSILON {
                    issues.push(format!(
                        "floor: split {node:?} child {:?} factor {} < {min_factor}",
                        child.node, child.factor
                    ));
                }
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use egui::Vec2;

    use super::super::test_util::*;
    use super::super::{Orientation, Split, SplitChild};
    use super::*;
    use crate::pane::DockEdge;

    #[test]
    fn healthy_tree_has_no_issues() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        tree.insert(pane(2), DockEdge::Right);
        tree.insert(pane(3), DockEdge::Bottom);
        assert!(tree.integrity_issues().is_empty());
        assert!(CompositionTree::<()>::empty().integrity_issues().is_empty());
    }

    #[test]
    fn reports_single_child_and_same_orientation_nesting() {
        let mut tree = CompositionTree::empty();
        let mut a = pane(1);
        a.transition(PaneState::Docked);
        let mut b = pane(2);
        b.transition(PaneState::Docked);
        let a = tree.alloc(CompositionNode::Terminal(a));
        let b = tree.alloc(CompositionNode::Terminal(b));
        let inner = tree.alloc(CompositionNode::Split(Split::new(
            Orientation::Vertical,
            vec![SplitChild::new(a, 1.0)],
            Vec2::ZERO,
        )));
        let root = tree.alloc(CompositionNode::Split(Split::new(
            Orientation::Vertical,
            vec![SplitChild::new(inner, 0.5), SplitChild::new(b, 0.25)],
            Vec2::ZERO,
        )));
        tree.set_root(Some(root));

        let issues = tree.integrity_issues();
        assert!(issues.iter().any(|i| i.contains("has 1 children")), "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("directly contains")), "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("sum to 0.75")), "{issues:?}");
    }

    #[test]
    fn reports_undocked_terminal_and_unreachable_nodes() {
        let mut tree = CompositionTree::empty();
        let root = tree.alloc(CompositionNode::Terminal(pane(1)));
        let _orphan = tree.alloc(CompositionNode::Terminal(pane(2)));
        tree.set_root(Some(root));

        let issues = tree.integrity_issues();
        assert!(issues.iter().any(|i| i.contains("state Hidden")), "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("unreachable nodes 1 of 2")), "{issues:?}");
    }

    #[test]
    fn floor_issues_ignore_tight_splits() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        tree.insert(pane(2), DockEdge::Right);
        let root = tree.root().unwrap();
        if let Some(split) = tree.split_mut(root) {
            split.size = Vec2::new(400.0, 100.0);
            split.children[0].factor = 0.05;
            split.children[1].factor = 0.95;
        }
        assert_eq!(tree.floor_issues(50.0).len(), 1);
        assert!(tree.floor_issues(300.0).is_empty());
    }
}

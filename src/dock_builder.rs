use std::collections::BTreeMap;

use crate::pane::{DockEdge, Pane, PaneState};
use crate::tree::{CompositionNode, CompositionTree, NodeId, Split, SplitChild};

/// A logical node id used by [`DockBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DockNodeId(u64);

#[derive(Clone, Debug)]
enum Node<C> {
    Leaf(Option<Pane<C>>),
    Split {
        edge: DockEdge,
        side_fraction: f64,
        main: DockNodeId,
        side: DockNodeId,
    },
}

/// Scripted layouts in the style of Dear ImGui's `DockBuilder`:
/// create an empty node, split it, dock panes into the leaves, then [`Self::finish`].
///
/// Leaves hold at most one pane. Leaves left empty are dropped when finishing, so a split
/// with one empty side collapses into the other.
pub struct DockBuilder<C> {
    next_node_id: u64,
    nodes: BTreeMap<DockNodeId, Node<C>>,
}

impl<C> Default for DockBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> DockBuilder<C> {
    pub fn new() -> Self {
        Self {
            next_node_id: 1,
            nodes: BTreeMap::new(),
        }
    }

    fn alloc_node_id(&mut self) -> DockNodeId {
        let id = DockNodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        id
    }

    /// Create an empty leaf node.
    #[must_use]
    pub fn add_node(&mut self) -> DockNodeId {
        let id = self.alloc_node_id();
        self.nodes.insert(id, Node::Leaf(None));
        id
    }

    /// Split an existing node and return `(side, main)`.
    ///
    /// `side` sits at `edge` of `main` and gets `side_fraction` of the space. The `node` itself
    /// becomes the split, and whatever it held moves into `main`.
    ///
    /// # Panics
    /// If `side_fraction` is not strictly between 0 and 1.
    #[must_use]
    pub fn split_node(
        &mut self,
        node: DockNodeId,
        edge: DockEdge,
        side_fraction: f64,
    ) -> (DockNodeId, DockNodeId) {
        assert!(
            side_fraction > 0.0 && side_fraction < 1.0,
            "split_node: side_fraction must be in (0, 1), got {side_fraction}"
        );

        let old = self.nodes.remove(&node).unwrap_or(Node::Leaf(None));
        let main = self.alloc_node_id();
        self.nodes.insert(main, old);

        let side = self.add_node();

        self.nodes.insert(
            node,
            Node::Split {
                edge,
                side_fraction,
                main,
                side,
            },
        );

        (side, main)
    }

    /// Put a hidden pane into an empty leaf.
    pub fn dock_pane(&mut self, pane: Pane<C>, node: DockNodeId) {
        assert!(
            pane.state() == PaneState::Hidden,
            "dock_pane: pane {} is already {:?}",
            pane.id(),
            pane.state()
        );
        match self.nodes.get_mut(&node) {
            Some(Node::Leaf(slot @ None)) => *slot = Some(pane),
            Some(Node::Leaf(Some(existing))) => {
                panic!("dock_pane: node {node:?} already holds pane {}", existing.id());
            }
            Some(Node::Split { .. }) => {
                panic!("dock_pane: node {node:?} is not a leaf node");
            }
            None => {
                panic!("dock_pane: node {node:?} does not exist");
            }
        }
    }

    /// Finish building and produce the [`CompositionTree`].
    ///
    /// `root` is typically the id returned by the first [`Self::add_node`], then split.
    pub fn finish(self, root: DockNodeId) -> CompositionTree<C> {
        self.finish_map(root, Some)
    }

    /// Finish building, mapping each pane's content along the way.
    ///
    /// Returning `None` drops that pane from the output tree.
    pub fn finish_map<D>(
        self,
        root: DockNodeId,
        mut map: impl FnMut(C) -> Option<D>,
    ) -> CompositionTree<D> {
        fn build_node<C, D>(
            node_id: DockNodeId,
            edge: Option<DockEdge>,
            nodes: &mut BTreeMap<DockNodeId, Node<C>>,
            tree: &mut CompositionTree<D>,
            map: &mut impl FnMut(C) -> Option<D>,
        ) -> Option<NodeId> {
            match nodes.remove(&node_id)? {
                Node::Leaf(pane) => {
                    let mut pane = pane?.try_map_content(&mut *map)?;
                    pane.set_dock_edge(edge.unwrap_or(pane.dock_edge()));
                    pane.transition(PaneState::Docked);
                    Some(tree.alloc(CompositionNode::Terminal(pane)))
                }
                Node::Split {
                    edge: side_edge,
                    side_fraction,
                    main,
                    side,
                } => {
                    let main_node = build_node(main, edge, nodes, tree, map);
                    let side_node = build_node(side, Some(side_edge), nodes, tree, map);
                    let (main_node, side_node) = match (main_node, side_node) {
                        (Some(main_node), Some(side_node)) => (main_node, side_node),
                        (only, None) | (None, only) => return only,
                    };

                    let main_child = SplitChild::new(main_node, 1.0 - side_fraction);
                    let side_child = SplitChild::new(side_node, side_fraction);
                    let children = if side_edge.is_leading() {
                        vec![side_child, main_child]
                    } else {
                        vec![main_child, side_child]
                    };
                    Some(tree.alloc(CompositionNode::Split(Split::new(
                        side_edge.orientation(),
                        children,
                        egui::Vec2::ZERO,
                    ))))
                }
            }
        }

        let mut nodes = self.nodes;
        let mut tree = CompositionTree::empty();
        let root_node = build_node(root, None, &mut nodes, &mut tree, &mut map);
        tree.set_root(root_node);
        tree.canonicalize();
        tree
    }
}

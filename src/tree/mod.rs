//! The composition tree: how docked panes are spatially arranged.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. A node never stores its parent;
//! restructuring replaces the contents of an arena slot in place, so whoever references that
//! slot (the root, or a parent [`Split`]) keeps pointing at the right place.
//!
//! Invariants kept by every public mutation:
//! - a [`Split`] never has exactly one child,
//! - a [`Split`] never has a direct child [`Split`] of the same [`Orientation`],
//! - the space factors of a [`Split`]'s children sum to `1.0` (within [`FACTOR_EPSILON`]).
//!
//! See [`CompositionTree::integrity_issues`] for a checker.

use egui::Vec2;

use crate::pane::{Pane, PaneId};

mod insert;
mod integrity;
mod normalize;
mod remove;

#[cfg(test)]
mod model_tests;

pub use insert::AutoPlacement;

/// Tolerance used when comparing space-factor sums.
pub const FACTOR_EPSILON: f64 = 1e-6;

/// Address of a node inside a [`CompositionTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Axis a [`Split`] stacks its children along.
///
/// A `Horizontal` split has horizontal separators: children are stacked top to bottom and
/// share the height. A `Vertical` split has vertical separators: children sit side by side
/// and share the width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Extent of `size` along the axis children are distributed on.
    pub fn main_extent(self, size: Vec2) -> f32 {
        match self {
            Self::Horizontal => size.y,
            Self::Vertical => size.x,
        }
    }

    /// Extent of `size` along the axis every child shares fully.
    pub fn cross_extent(self, size: Vec2) -> f32 {
        match self {
            Self::Horizontal => size.x,
            Self::Vertical => size.y,
        }
    }

    pub(crate) fn vec(self, main: f32, cross: f32) -> Vec2 {
        match self {
            Self::Horizontal => Vec2::new(cross, main),
            Self::Vertical => Vec2::new(main, cross),
        }
    }
}

/// One entry of a [`Split`].
#[derive(Clone, Copy, Debug)]
pub struct SplitChild {
    pub node: NodeId,

    /// Fraction of the parent's main-axis extent, in `(0, 1]`.
    pub factor: f64,

    /// Main-axis extent this slot had the last time it was arranged.
    ///
    /// Cleared whenever a structural mutation rewrites the factors of the owning split.
    pub extent: Option<f32>,
}

impl SplitChild {
    pub(crate) fn new(node: NodeId, factor: f64) -> Self {
        Self {
            node,
            factor,
            extent: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Split {
    pub orientation: Orientation,
    pub children: Vec<SplitChild>,

    /// Last concrete size this split was arranged at.
    pub size: Vec2,
}

impl Split {
    pub(crate) fn new(orientation: Orientation, children: Vec<SplitChild>, size: Vec2) -> Self {
        Self {
            orientation,
            children,
            size,
        }
    }

    pub fn factor_sum(&self) -> f64 {
        self.children.iter().map(|c| c.factor).sum()
    }

    pub(crate) fn clear_extents(&mut self) {
        for child in &mut self.children {
            child.extent = None;
        }
    }
}

#[derive(Clone, Debug)]
pub enum CompositionNode<C> {
    Terminal(Pane<C>),
    Split(Split),
}

impl<C> CompositionNode<C> {
    pub fn as_split(&self) -> Option<&Split> {
        match self {
            Self::Split(split) => Some(split),
            Self::Terminal(_) => None,
        }
    }

    pub fn as_pane(&self) -> Option<&Pane<C>> {
        match self {
            Self::Terminal(pane) => Some(pane),
            Self::Split(_) => None,
        }
    }

    /// Last concrete size of the area this node occupied.
    pub fn size(&self) -> Vec2 {
        match self {
            Self::Terminal(pane) => pane.size,
            Self::Split(split) => split.size,
        }
    }

    pub(crate) fn set_size(&mut self, size: Vec2) {
        match self {
            Self::Terminal(pane) => pane.size = size,
            Self::Split(split) => split.size = size,
        }
    }
}

/// Plain-data copy of a tree's structure, for comparisons and debugging.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeShape {
    Terminal(PaneId),
    Split(Orientation, Vec<(TreeShape, f64)>),
}

impl TreeShape {
    /// Structural equality with factors compared to within `epsilon`.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        match (self, other) {
            (Self::Terminal(a), Self::Terminal(b)) => a == b,
            (Self::Split(oa, ca), Self::Split(ob, cb)) => {
                oa == ob
                    && ca.len() == cb.len()
                    && ca.iter().zip(cb).all(|((sa, fa), (sb, fb))| {
                        (fa - fb).abs() <= epsilon && sa.approx_eq(sb, epsilon)
                    })
            }
            _ => false,
        }
    }
}

/// Hierarchy of split and terminal nodes with proportional sizing.
#[derive(Clone, Debug)]
pub struct CompositionTree<C> {
    nodes: Vec<Option<CompositionNode<C>>>,
    free: Vec<usize>,
    root: Option<NodeId>,
}

impl<C> Default for CompositionTree<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C> CompositionTree<C> {
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn get(&self, node: NodeId) -> Option<&CompositionNode<C>> {
        self.nodes.get(node.0)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, node: NodeId) -> Option<&mut CompositionNode<C>> {
        self.nodes.get_mut(node.0)?.as_mut()
    }

    pub fn split(&self, node: NodeId) -> Option<&Split> {
        self.get(node)?.as_split()
    }

    pub(crate) fn split_mut(&mut self, node: NodeId) -> Option<&mut Split> {
        match self.get_mut(node)? {
            CompositionNode::Split(split) => Some(split),
            CompositionNode::Terminal(_) => None,
        }
    }

    /// Number of live arena slots.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub(crate) fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId(i))
    }

    pub(crate) fn alloc(&mut self, node: CompositionNode<C>) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.nodes[index] = Some(node);
            NodeId(index)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    /// Remove a slot from the arena and hand back its contents.
    ///
    /// # Panics
    /// If the slot is already vacant.
    pub(crate) fn take(&mut self, node: NodeId) -> CompositionNode<C> {
        let Some(contents) = self.nodes.get_mut(node.0).and_then(Option::take) else {
            panic!("composition tree: node {node:?} is vacant");
        };
        self.free.push(node.0);
        contents
    }

    /// Replace the contents of a live slot, keeping its address.
    pub(crate) fn replace(&mut self, node: NodeId, contents: CompositionNode<C>) -> CompositionNode<C> {
        let Some(slot) = self.nodes.get_mut(node.0).and_then(Option::as_mut) else {
            panic!("composition tree: node {node:?} is vacant");
        };
        std::mem::replace(slot, contents)
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Depth-first search for the terminal wrapping `pane`.
    pub fn find(&self, pane: PaneId) -> Option<NodeId> {
        self.terminals()
            .into_iter()
            .find(|&node| self.get(node).and_then(CompositionNode::as_pane).is_some_and(|p| p.id() == pane))
    }

    pub fn contains(&self, pane: PaneId) -> bool {
        self.find(pane).is_some()
    }

    /// The split directly holding `node`, and `node`'s index in it.
    pub fn parent_of(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(current) = stack.pop() {
            let Some(split) = self.split(current) else {
                continue;
            };
            if let Some(index) = split.children.iter().position(|c| c.node == node) {
                return Some((current, index));
            }
            stack.extend(split.children.iter().map(|c| c.node));
        }
        None
    }

    /// Terminal nodes in depth-first, child-order traversal.
    pub fn terminals(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(node) = stack.pop() {
            match self.get(node) {
                Some(CompositionNode::Terminal(_)) => out.push(node),
                Some(CompositionNode::Split(split)) => {
                    stack.extend(split.children.iter().rev().map(|c| c.node));
                }
                None => {}
            }
        }
        out
    }

    /// Docked panes in traversal order.
    pub fn panes(&self) -> impl Iterator<Item = &Pane<C>> + '_ {
        self.terminals()
            .into_iter()
            .filter_map(|node| self.get(node).and_then(CompositionNode::as_pane))
    }

    pub fn pane(&self, pane: PaneId) -> Option<&Pane<C>> {
        self.get(self.find(pane)?)?.as_pane()
    }

    pub fn pane_mut(&mut self, pane: PaneId) -> Option<&mut Pane<C>> {
        let node = self.find(pane)?;
        match self.get_mut(node)? {
            CompositionNode::Terminal(pane) => Some(pane),
            CompositionNode::Split(_) => None,
        }
    }

    pub fn pane_ids(&self) -> Vec<PaneId> {
        self.panes().map(Pane::id).collect()
    }

    pub fn shape(&self) -> Option<TreeShape> {
        self.root.map(|root| self.shape_of(root))
    }

    fn shape_of(&self, node: NodeId) -> TreeShape {
        match self.get(node) {
            Some(CompositionNode::Terminal(pane)) => TreeShape::Terminal(pane.id()),
            Some(CompositionNode::Split(split)) => TreeShape::Split(
                split.orientation,
                split
                    .children
                    .iter()
                    .map(|c| (self.shape_of(c.node), c.factor))
                    .collect(),
            ),
            None => panic!("composition tree: dangling reference to {node:?}"),
        }
    }

    /// Drop every node and hand back the panes they held, in traversal order.
    pub(crate) fn drain_panes(&mut self) -> Vec<Pane<C>> {
        let order = self.terminals();
        let mut panes = Vec::with_capacity(order.len());
        for node in order {
            if let CompositionNode::Terminal(pane) = self.take(node) {
                panes.push(pane);
            }
        }
        *self = Self::empty();
        panes
    }
}

//! Turning a [`CompositionTree`] into concrete rectangles.

use ahash::AHashMap;
use egui::{Pos2, Rect, Vec2};

use crate::options::DockingOptions;
use crate::pane::PaneId;
use crate::tree::{CompositionNode, CompositionTree, NodeId, Orientation};

/// The boundary between children `index` and `index + 1` of a split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeparatorRef {
    pub split: NodeId,
    pub index: usize,

    /// Orientation of the owning split. A `Vertical` split has a vertical separator
    /// that is dragged horizontally.
    pub orientation: Orientation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupant {
    Pane(PaneId),
    Separator(SeparatorRef),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub rect: Rect,
    pub occupant: Occupant,
}

/// Result of [`arrange`]: every pane and separator with its rectangle, in traversal order.
#[derive(Clone, Debug, Default)]
pub struct Arrangement {
    pub regions: Vec<Region>,

    /// Rectangle assigned to every node, splits included.
    pub node_rects: AHashMap<NodeId, Rect>,

    /// Smallest size the arranged tree can take without squeezing a pane below its minimum.
    pub min_size: Vec2,
}

impl Arrangement {
    pub fn pane_rect(&self, pane: PaneId) -> Option<Rect> {
        self.regions.iter().find_map(|r| match r.occupant {
            Occupant::Pane(id) if id == pane => Some(r.rect),
            _ => None,
        })
    }

    pub fn node_rect(&self, node: NodeId) -> Option<Rect> {
        self.node_rects.get(&node).copied()
    }

    pub fn panes(&self) -> impl Iterator<Item = (PaneId, Rect)> + '_ {
        self.regions.iter().filter_map(|r| match r.occupant {
            Occupant::Pane(id) => Some((id, r.rect)),
            Occupant::Separator(_) => None,
        })
    }

    pub fn separators(&self) -> impl Iterator<Item = (SeparatorRef, Rect)> + '_ {
        self.regions.iter().filter_map(|r| match r.occupant {
            Occupant::Separator(sep) => Some((sep, r.rect)),
            Occupant::Pane(_) => None,
        })
    }

    /// The separator under `pos`, if any.
    pub fn separator_at(&self, pos: Pos2) -> Option<SeparatorRef> {
        self.separators()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(sep, _)| sep)
    }
}

/// Lay `tree` out inside `rect`.
///
/// Each split hands its children `factor * available` points along its main axis, where
/// `available` is the main extent minus the separators. Children are raised to
/// `min_pane_extent` when every child can have it; the last child takes whatever is left so
/// rounding never opens a gap.
pub fn arrange<C>(tree: &CompositionTree<C>, rect: Rect, options: &DockingOptions) -> Arrangement {
    let mut arrangement = Arrangement::default();
    if let Some(root) = tree.root() {
        arrangement.min_size = arrange_node(tree, root, rect, options, &mut arrangement);
    }
    arrangement
}

fn arrange_node<C>(
    tree: &CompositionTree<C>,
    node: NodeId,
    rect: Rect,
    options: &DockingOptions,
    out: &mut Arrangement,
) -> Vec2 {
    out.node_rects.insert(node, rect);
    let min_extent = options.min_pane_extent;

    match tree.get(node) {
        None => Vec2::ZERO,
        Some(CompositionNode::Terminal(pane)) => {
            out.regions.push(Region {
                rect,
                occupant: Occupant::Pane(pane.id()),
            });
            Vec2::new(
                pane.min_size.x.max(min_extent),
                pane.min_size.y.max(min_extent),
            )
        }
        Some(CompositionNode::Split(split)) => {
            let orientation = split.orientation;
            let count = split.children.len();
            let thickness = options.separator_thickness;
            let separators = thickness * count.saturating_sub(1) as f32;
            let main = orientation.main_extent(rect.size());
            let cross = orientation.cross_extent(rect.size());
            let available = (main - separators).max(0.0);

            let factors: Vec<f64> = split.children.iter().map(|c| c.factor).collect();
            let extents = distribute(available, &factors, min_extent);
            if available < min_extent * count as f32 {
                log::trace!(
                    "arrange {node:?}: {available} points for {count} children, below the {min_extent} floor"
                );
            }

            let mut cursor = rect.min;
            let mut min_main = separators;
            let mut min_cross: f32 = 0.0;
            for (index, (child, extent)) in split.children.iter().zip(extents).enumerate() {
                let child_rect = Rect::from_min_size(cursor, orientation.vec(extent, cross));
                let child_min = arrange_node(tree, child.node, child_rect, options, out);
                min_main += orientation.main_extent(child_min);
                min_cross = min_cross.max(orientation.cross_extent(child_min));
                cursor += orientation.vec(extent, 0.0);

                if index + 1 < count {
                    out.regions.push(Region {
                        rect: Rect::from_min_size(cursor, orientation.vec(thickness, cross)),
                        occupant: Occupant::Separator(SeparatorRef {
                            split: node,
                            index,
                            orientation,
                        }),
                    });
                    cursor += orientation.vec(thickness, 0.0);
                }
            }

            orientation.vec(min_main, min_cross)
        }
    }
}

/// Split `available` points by `factors`, with a `min_extent` floor when everyone fits.
fn distribute(available: f32, factors: &[f64], min_extent: f32) -> Vec<f32> {
    let count = factors.len();
    let mut extents: Vec<f32> = factors
        .iter()
        .map(|&f| (f * f64::from(available)) as f32)
        .collect();

    if count > 0 && available >= min_extent * count as f32 {
        for extent in &mut extents {
            *extent = extent.max(min_extent);
        }
        let excess: f32 = extents.iter().sum::<f32>() - available;
        let slack: f32 = extents.iter().map(|e| e - min_extent).sum();
        if excess > 0.0 && slack > 0.0 {
            for extent in &mut extents {
                *extent -= excess * (*extent - min_extent) / slack;
            }
        }
    }

    if let Some((last, rest)) = extents.split_last_mut() {
        *last = (available - rest.iter().sum::<f32>()).max(0.0);
    }
    extents
}

impl<C> CompositionTree<C> {
    /// Remember the sizes an [`Arrangement`] of this tree gave every node.
    ///
    /// Normalization reads them back as each child's occupied extent.
    pub fn apply_arrangement(&mut self, arrangement: &Arrangement) {
        for node in self.node_ids().collect::<Vec<_>>() {
            let Some(rect) = arrangement.node_rect(node) else {
                continue;
            };
            let child_extents: Vec<Option<f32>> = self
                .split(node)
                .map(|split| {
                    split
                        .children
                        .iter()
                        .map(|c| {
                            arrangement
                                .node_rect(c.node)
                                .map(|r| split.orientation.main_extent(r.size()))
                        })
                        .collect()
                })
                .unwrap_or_default();

            if let Some(contents) = self.get_mut(node) {
                contents.set_size(rect.size());
            }
            if let Some(split) = self.split_mut(node) {
                for (child, extent) in split.children.iter_mut().zip(child_extents) {
                    child.extent = extent;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::pos2;

    use super::*;
    use crate::pane::{DockEdge, Pane};

    fn pane(id: u64) -> Pane<()> {
        Pane::new(PaneId::from_u64(id), ())
    }

    fn id(raw: u64) -> PaneId {
        PaneId::from_u64(raw)
    }

    fn area(w: f32, h: f32) -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(w, h))
    }

    #[test]
    fn empty_tree_has_no_regions() {
        let tree: CompositionTree<()> = CompositionTree::empty();
        let arrangement = arrange(&tree, area(100.0, 100.0), &DockingOptions::default());
        assert!(arrangement.regions.is_empty());
        assert_eq!(arrangement.min_size, Vec2::ZERO);
    }

    #[test]
    fn single_terminal_fills_the_area() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        let arrangement = arrange(&tree, area(300.0, 200.0), &DockingOptions::default());
        assert_eq!(arrangement.regions.len(), 1);
        assert_eq!(arrangement.pane_rect(id(1)), Some(area(300.0, 200.0)));
        assert_eq!(arrangement.min_size, Vec2::splat(50.0));
    }

    #[test]
    fn side_by_side_with_separator() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        tree.insert(pane(2), DockEdge::Right);
        let arrangement = arrange(&tree, area(200.0, 100.0), &DockingOptions::default());

        assert_eq!(arrangement.regions.len(), 3);
        let a = arrangement.pane_rect(id(1)).unwrap();
        let b = arrangement.pane_rect(id(2)).unwrap();
        let (sep, sep_rect) = arrangement.separators().next().unwrap();
        assert_eq!((a.min.x, a.max.x), (0.0, 98.0));
        assert_eq!((sep_rect.min.x, sep_rect.max.x), (98.0, 102.0));
        assert_eq!((b.min.x, b.max.x), (102.0, 200.0));
        assert_eq!((a.height(), b.height(), sep_rect.height()), (100.0, 100.0, 100.0));
        assert_eq!(sep.index, 0);
        assert_eq!(sep.orientation, Orientation::Vertical);
        assert_eq!(arrangement.separator_at(pos2(100.0, 50.0)), Some(sep));
        assert_eq!(arrangement.separator_at(pos2(50.0, 50.0)), None);
    }

    #[test]
    fn stacked_children_share_the_height() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Top);
        tree.insert(pane(2), DockEdge::Bottom);
        let arrangement = arrange(&tree, area(100.0, 204.0), &DockingOptions::default());
        let a = arrangement.pane_rect(id(1)).unwrap();
        let b = arrangement.pane_rect(id(2)).unwrap();
        assert_eq!((a.min.y, a.max.y), (0.0, 100.0));
        assert_eq!((b.min.y, b.max.y), (104.0, 204.0));
        assert_eq!(a.width(), 100.0);
    }

    #[test]
    fn small_factors_are_raised_to_the_floor() {
        let extents = distribute(400.0, &[0.05, 0.45, 0.5], 50.0);
        assert_eq!(extents.len(), 3);
        assert!((extents[0] - 50.0).abs() < 1e-3, "{extents:?}");
        assert!((extents.iter().sum::<f32>() - 400.0).abs() < 1e-3);
        assert!(extents.iter().all(|&e| e >= 50.0 - 1e-3));
    }

    #[test]
    fn degenerate_space_is_shared_without_floor() {
        let extents = distribute(60.0, &[0.25, 0.75], 50.0);
        assert_eq!(extents, vec![15.0, 45.0]);
        let extents = distribute(0.0, &[0.5, 0.5], 50.0);
        assert_eq!(extents, vec![0.0, 0.0]);
    }

    #[test]
    fn min_size_is_reported_bottom_up() {
        // Vertical[ Horizontal[1, 3], 2 ]
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        let mut wide = pane(2);
        wide.min_size = Vec2::new(120.0, 10.0);
        tree.insert(wide, DockEdge::Right);
        tree.insert_relative(pane(3), id(1), DockEdge::Bottom);

        let arrangement = arrange(&tree, area(400.0, 300.0), &DockingOptions::default());
        // width: 50 + 4 + 120, height: max(50 + 4 + 50, 50)
        assert_eq!(arrangement.min_size, Vec2::new(174.0, 104.0));
    }

    #[test]
    fn applying_records_sizes_and_extents() {
        let mut tree = CompositionTree::empty();
        tree.insert(pane(1), DockEdge::Left);
        tree.insert(pane(2), DockEdge::Right);
        let arrangement = arrange(&tree, area(200.0, 100.0), &DockingOptions::default());
        tree.apply_arrangement(&arrangement);

        assert_eq!(tree.pane(id(1)).unwrap().size, Vec2::new(98.0, 100.0));
        let root = tree.root().unwrap();
        let split = tree.split(root).unwrap();
        assert_eq!(split.size, Vec2::new(200.0, 100.0));
        assert_eq!(split.children[0].extent, Some(98.0));
        assert_eq!(split.children[1].extent, Some(98.0));
    }
}

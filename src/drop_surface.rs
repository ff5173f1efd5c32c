//! Regions that respond to a pane being dragged over them.

use egui::{Pos2, Rect, Vec2, vec2};

use crate::pane::{DockEdge, PaneId};

/// Handle of a registered [`DropSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropSurfaceKind {
    /// A docked pane. Hovering it shows the relative indicators; it never accepts a drop itself.
    Pane(PaneId),

    /// Dock against the whole docking area.
    DockEdgeIndicator(DockEdge),

    /// Dock against one pane.
    RelativeDockIndicator { pane: PaneId, edge: DockEdge },
}

impl DropSurfaceKind {
    /// The edge a drop on this surface docks at, if it accepts drops at all.
    pub fn dock_edge(self) -> Option<DockEdge> {
        match self {
            Self::Pane(_) => None,
            Self::DockEdgeIndicator(edge) | Self::RelativeDockIndicator { edge, .. } => Some(edge),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropSurface {
    pub id: SurfaceId,
    pub kind: DropSurfaceKind,
    pub rect: Rect,
}

/// Every live drop surface, in registration order.
///
/// Registration order decides which surface wins when several accept a drop.
#[derive(Clone, Debug, Default)]
pub struct DropSurfaceRegistry {
    next_id: u64,
    surfaces: Vec<DropSurface>,
}

impl DropSurfaceRegistry {
    pub fn register(&mut self, kind: DropSurfaceKind, rect: Rect) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        log::trace!("register drop surface {id:?} {kind:?}");
        self.surfaces.push(DropSurface { id, kind, rect });
        id
    }

    pub fn unregister(&mut self, id: SurfaceId) -> Option<DropSurface> {
        let index = self.surfaces.iter().position(|s| s.id == id)?;
        log::trace!("unregister drop surface {id:?}");
        Some(self.surfaces.remove(index))
    }

    /// Unregister every surface matching `predicate`, returning their ids.
    pub fn unregister_where(
        &mut self,
        mut predicate: impl FnMut(&DropSurface) -> bool,
    ) -> Vec<SurfaceId> {
        let mut removed = Vec::new();
        self.surfaces.retain(|s| {
            if predicate(s) {
                removed.push(s.id);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn set_rect(&mut self, id: SurfaceId, rect: Rect) -> bool {
        match self.surfaces.iter_mut().find(|s| s.id == id) {
            Some(surface) => {
                surface.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: SurfaceId) -> Option<&DropSurface> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DropSurface> + '_ {
        self.surfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Surfaces containing `pos`, in registration order.
    pub fn hits(&self, pos: Pos2) -> Vec<SurfaceId> {
        self.surfaces
            .iter()
            .filter(|s| s.rect.contains(pos))
            .map(|s| s.id)
            .collect()
    }

    pub fn surface_for_pane(&self, pane: PaneId) -> Option<SurfaceId> {
        self.surfaces
            .iter()
            .find(|s| s.kind == DropSurfaceKind::Pane(pane))
            .map(|s| s.id)
    }
}

/// Square for the edge indicator of `edge`, centred on that edge of `area` and inset by `margin`.
pub fn edge_indicator_rect(area: Rect, edge: DockEdge, size: f32, margin: f32) -> Rect {
    let half = size * 0.5;
    let center = area.center();
    let center = match edge {
        DockEdge::Left => Pos2::new(area.min.x + margin + half, center.y),
        DockEdge::Right => Pos2::new(area.max.x - margin - half, center.y),
        DockEdge::Top => Pos2::new(center.x, area.min.y + margin + half),
        DockEdge::Bottom => Pos2::new(center.x, area.max.y - margin - half),
    };
    Rect::from_center_size(center, Vec2::splat(size))
}

/// Square for the relative indicator of `edge`, one indicator away from the centre of `pane_rect`.
pub fn relative_indicator_rect(pane_rect: Rect, edge: DockEdge, size: f32) -> Rect {
    let offset = match edge {
        DockEdge::Left => vec2(-size, 0.0),
        DockEdge::Right => vec2(size, 0.0),
        DockEdge::Top => vec2(0.0, -size),
        DockEdge::Bottom => vec2(0.0, size),
    };
    Rect::from_center_size(pane_rect.center() + offset, Vec2::splat(size))
}

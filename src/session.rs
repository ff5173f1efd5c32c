use ahash::{AHashMap, AHashSet};
use egui::{Pos2, Vec2};

use crate::drop_surface::SurfaceId;
use crate::pane::PaneId;

/// The drag currently in progress on a [`crate::DockingSurface`], if any.
///
/// `Idle -> Dragging` on begin, back to `Idle` on end or cancel.
#[derive(Debug, Default)]
pub struct DragSession {
    next_id: u64,
    active: Option<ActiveDrag>,
}

#[derive(Debug)]
pub(crate) struct ActiveDrag {
    pub(crate) id: u64,
    pub(crate) pane: PaneId,
    pub(crate) grab_offset: Vec2,
    pub(crate) pointer: Pos2,

    /// Surfaces under the pointer after the last move, in registration order.
    pub(crate) under_pointer: Vec<SurfaceId>,

    pub(crate) edge_indicators: Vec<SurfaceId>,

    /// Relative indicators currently shown, keyed by the pane they dock against.
    pub(crate) relative_indicators: AHashMap<PaneId, Vec<SurfaceId>>,
}

impl DragSession {
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_pane(&self) -> Option<PaneId> {
        self.active.as_ref().map(|a| a.pane)
    }

    /// Offset from the floating container's top-left corner to the pointer.
    pub fn pointer_offset(&self) -> Option<Vec2> {
        self.active.as_ref().map(|a| a.grab_offset)
    }

    pub fn surfaces_under_pointer(&self) -> &[SurfaceId] {
        self.active.as_ref().map_or(&[], |a| a.under_pointer.as_slice())
    }

    pub(crate) fn start(&mut self, pane: PaneId, pointer: Pos2, grab_offset: Vec2) -> &mut ActiveDrag {
        let id = self.next_id.max(1);
        self.next_id = id.saturating_add(1);
        log::debug!("drag session START id={id} pane={pane}");
        self.active.insert(ActiveDrag {
            id,
            pane,
            grab_offset,
            pointer,
            under_pointer: Vec::new(),
            edge_indicators: Vec::new(),
            relative_indicators: AHashMap::new(),
        })
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut ActiveDrag> {
        self.active.as_mut()
    }

    pub(crate) fn finish(&mut self) -> Option<ActiveDrag> {
        let ended = self.active.take()?;
        log::debug!("drag session END id={} pane={}", ended.id, ended.pane);
        Some(ended)
    }
}

/// How the set of hit surfaces changed between two pointer positions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct HitDiff {
    pub(crate) left: Vec<SurfaceId>,
    pub(crate) entered: Vec<SurfaceId>,
    pub(crate) stayed: Vec<SurfaceId>,
}

/// Each list keeps the order of the slice it comes from.
pub(crate) fn diff_hits(previous: &[SurfaceId], current: &[SurfaceId]) -> HitDiff {
    let before: AHashSet<SurfaceId> = previous.iter().copied().collect();
    let after: AHashSet<SurfaceId> = current.iter().copied().collect();
    HitDiff {
        left: previous.iter().copied().filter(|s| !after.contains(s)).collect(),
        entered: current.iter().copied().filter(|s| !before.contains(s)).collect(),
        stayed: current.iter().copied().filter(|s| before.contains(s)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use egui::{Rect, pos2, vec2};

    use super::*;
    use crate::drop_surface::{DropSurfaceKind, DropSurfaceRegistry};

    fn ids(n: usize) -> Vec<SurfaceId> {
        let mut registry = DropSurfaceRegistry::default();
        (0..n)
            .map(|i| registry.register(DropSurfaceKind::Pane(PaneId::from_u64(i as u64)), Rect::NOTHING))
            .collect()
    }

    #[test]
    fn diff_splits_into_left_entered_stayed() {
        let s = ids(4);
        let diff = diff_hits(&[s[0], s[1], s[2]], &[s[1], s[3]]);
        assert_eq!(diff.left, vec![s[0], s[2]]);
        assert_eq!(diff.entered, vec![s[3]]);
        assert_eq!(diff.stayed, vec![s[1]]);
        assert_eq!(diff_hits(&[], &[]), HitDiff::default());
    }

    #[test]
    fn session_lifecycle() {
        let mut session = DragSession::default();
        assert!(!session.is_dragging());
        assert!(session.surfaces_under_pointer().is_empty());

        let pane = PaneId::from_u64(3);
        let first = session.start(pane, pos2(10.0, 10.0), vec2(2.0, 3.0)).id;
        assert!(session.is_dragging());
        assert_eq!(session.active_pane(), Some(pane));
        assert_eq!(session.pointer_offset(), Some(vec2(2.0, 3.0)));

        let ended = session.finish().unwrap();
        assert_eq!(ended.id, first);
        assert!(session.finish().is_none());

        let second = session.start(pane, Pos2::ZERO, Vec2::ZERO).id;
        assert!(second > first);
    }
}

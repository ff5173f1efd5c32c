//! Drag-and-drop re-docking: begin, move, end and cancel on a [`DockingSurface`].

use ahash::AHashMap;
use egui::{Pos2, Vec2};
use itertools::Itertools as _;

use crate::drop_surface::{
    DropSurfaceKind, SurfaceId, edge_indicator_rect, relative_indicator_rect,
};
use crate::host::{DockHost, DragEvent, DragNotification};
use crate::pane::{DockEdge, PaneId, PaneState};
use crate::session::diff_hits;
use crate::surface::DockingSurface;

/// What [`DockingSurface::end_drag`] did with the dragged pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// A surface accepted the drop and the pane is docked again.
    Docked {
        surface: SurfaceId,
        edge: DockEdge,

        /// The pane it was docked against, or `None` for the whole docking area.
        relative: Option<PaneId>,
    },

    /// Nothing accepted the drop; the pane stays in its floating container.
    Floating,
}

impl<C> DockingSurface<C> {
    /// Start dragging `pane` with the pointer at `pointer`.
    ///
    /// A docked pane is taken out of the tree into a floating container placed at
    /// `pointer - grab_offset`; a floating pane is brought to front and moved there.
    ///
    /// Returns `false` (and changes nothing) if a drag is already running, the pane does not
    /// allow dragging, or the host refuses pointer capture.
    ///
    /// # Panics
    /// If `pane` is neither docked nor floating.
    pub fn begin_drag(
        &mut self,
        host: &mut dyn DockHost<C>,
        pane: PaneId,
        pointer: Pos2,
        grab_offset: Vec2,
    ) -> bool {
        if let Some(active) = self.session.active_pane() {
            log::debug!("begin_drag {pane}: already dragging {active}");
            return false;
        }
        let Some(state) = self.pane_state(pane) else {
            panic!("begin_drag: unknown pane {pane}");
        };
        assert!(
            state != PaneState::Hidden,
            "begin_drag: pane {pane} is not visible"
        );
        if self.pane(pane).is_some_and(|p| !p.allows_drag) {
            log::debug!("begin_drag {pane}: pane does not allow dragging");
            return false;
        }
        if !host.acquire_pointer_capture() {
            log::debug!("begin_drag {pane}: pointer capture refused");
            return false;
        }

        let position = pointer - grab_offset;
        if state == PaneState::Docked {
            self.float_docked(pane, position);
            self.after_structural_change();
        } else {
            let _ = self.move_floating(pane, position);
            self.floating.bring_to_front(pane);
        }

        let area = self.area;
        let size = self.options.indicator_size;
        let margin = self.options.indicator_margin;
        let edge_indicators: Vec<SurfaceId> = DockEdge::ALL
            .into_iter()
            .map(|edge| {
                self.registry.register(
                    DropSurfaceKind::DockEdgeIndicator(edge),
                    edge_indicator_rect(area, edge, size, margin),
                )
            })
            .collect();

        let active = self.session.start(pane, pointer, grab_offset);
        active.edge_indicators = edge_indicators;
        true
    }

    /// Follow the pointer: move the floating container and deliver enter/over/leave.
    ///
    /// Leaves are delivered before enters. A pane surface that is entered gets four relative
    /// indicators; they take part in hit testing from the next move or the drop.
    pub fn drag_move(&mut self, host: &mut dyn DockHost<C>, pointer: Pos2) {
        let Some(active) = self.session.active_mut() else {
            log::trace!("drag_move without a drag session");
            return;
        };
        active.pointer = pointer;
        let dragged = active.pane;
        let position = pointer - active.grab_offset;
        let previous = active.under_pointer.clone();
        let _ = self.move_floating(dragged, position);

        let kinds: AHashMap<SurfaceId, DropSurfaceKind> =
            self.registry.iter().map(|s| (s.id, s.kind)).collect();
        let hits = self.registry.hits(pointer);

        // Panes the pointer left take their relative indicators with them.
        let mut dropped_indicators: Vec<SurfaceId> = Vec::new();
        for surface in diff_hits(&previous, &hits).left {
            if let Some(DropSurfaceKind::Pane(target)) = kinds.get(&surface) {
                dropped_indicators.extend(self.remove_relative_indicators(*target));
            }
        }
        let hits: Vec<SurfaceId> = hits
            .into_iter()
            .filter(|s| !dropped_indicators.contains(s))
            .collect();

        let diff = diff_hits(&previous, &hits);
        let events = diff
            .left
            .iter()
            .map(|&s| (s, DragEvent::Leave))
            .chain(diff.entered.iter().map(|&s| (s, DragEvent::Enter)))
            .chain(diff.stayed.iter().map(|&s| (s, DragEvent::Over)));
        for (surface, event) in events {
            if let Some(&kind) = kinds.get(&surface) {
                host.drag_notification(&DragNotification {
                    surface,
                    kind,
                    pane: dragged,
                    event,
                    pointer,
                });
            }
        }

        for &surface in &diff.entered {
            if let Some(DropSurfaceKind::Pane(target)) = kinds.get(&surface) {
                self.show_relative_indicators(*target);
            }
        }

        if let Some(active) = self.session.active_mut() {
            active.under_pointer = hits;
        }
    }

    /// Release the pointer at `pointer`.
    ///
    /// Surfaces are tried in registration order; the first one under the pointer that accepts,
    /// and that the host does not refuse, wins. Returns `None` if no drag was running.
    pub fn end_drag(&mut self, host: &mut dyn DockHost<C>, pointer: Pos2) -> Option<DropOutcome> {
        let dragged = self.session.active_pane()?;
        let grab_offset = self.session.pointer_offset().unwrap_or(Vec2::ZERO);
        let _ = self.move_floating(dragged, pointer - grab_offset);

        let mut accepted: Option<(SurfaceId, DropSurfaceKind)> = None;
        let candidates: Vec<(SurfaceId, DropSurfaceKind)> = self
            .registry
            .iter()
            .filter(|s| s.rect.contains(pointer))
            .map(|s| (s.id, s.kind))
            .collect();
        log::trace!(
            "drop of {dragged} at {pointer:?}, candidates [{}]",
            candidates.iter().map(|(surface, _)| surface.get()).join(", ")
        );
        for (surface, kind) in candidates {
            let accepts = self.accepts_drop(kind, dragged) && host.accept_drop(dragged, kind);
            host.drag_notification(&DragNotification {
                surface,
                kind,
                pane: dragged,
                event: DragEvent::Drop { accepted: accepts },
                pointer,
            });
            if accepts {
                accepted = Some((surface, kind));
                break;
            }
        }

        let under_pointer = self.session.surfaces_under_pointer().to_vec();
        for surface in under_pointer {
            if accepted.is_some_and(|(id, _)| id == surface) {
                continue;
            }
            if let Some(kind) = self.registry.get(surface).map(|s| s.kind) {
                host.drag_notification(&DragNotification {
                    surface,
                    kind,
                    pane: dragged,
                    event: DragEvent::Leave,
                    pointer,
                });
            }
        }

        self.finish_session(host);

        let Some((surface, kind)) = accepted else {
            log::debug!("drop of {dragged} accepted by nothing, pane stays floating");
            return Some(DropOutcome::Floating);
        };
        Some(self.apply_drop(dragged, surface, kind))
    }

    /// Abort the drag. The pane stays floating and the tree is untouched.
    pub fn cancel_drag(&mut self, host: &mut dyn DockHost<C>) {
        let Some(dragged) = self.session.active_pane() else {
            return;
        };
        log::debug!("cancel drag of {dragged}");
        let pointer = self.session.active_mut().map_or(Pos2::ZERO, |a| a.pointer);
        for surface in self.session.surfaces_under_pointer().to_vec() {
            if let Some(kind) = self.registry.get(surface).map(|s| s.kind) {
                host.drag_notification(&DragNotification {
                    surface,
                    kind,
                    pane: dragged,
                    event: DragEvent::Leave,
                    pointer,
                });
            }
        }
        self.finish_session(host);
    }

    fn accepts_drop(&self, kind: DropSurfaceKind, dragged: PaneId) -> bool {
        match kind {
            DropSurfaceKind::Pane(_) => false,
            DropSurfaceKind::DockEdgeIndicator(_) => true,
            DropSurfaceKind::RelativeDockIndicator { pane, .. } => {
                pane != dragged && self.tree.contains(pane)
            }
        }
    }

    fn apply_drop(&mut self, dragged: PaneId, surface: SurfaceId, kind: DropSurfaceKind) -> DropOutcome {
        let Some(container) = self.floating.remove(dragged) else {
            panic!("end_drag: dragged pane {dragged} lost its floating container");
        };
        let mut pane = container.pane;
        pane.floating_position = container.position;
        pane.floating_size = container.size;

        let (edge, relative) = match kind {
            DropSurfaceKind::DockEdgeIndicator(edge) => {
                self.tree.insert(pane, edge);
                (edge, None)
            }
            DropSurfaceKind::RelativeDockIndicator { pane: target, edge } => {
                self.tree.insert_relative(pane, target, edge);
                (edge, Some(target))
            }
            DropSurfaceKind::Pane(_) => unreachable!("pane surfaces never accept drops"),
        };
        log::debug!("dropped {dragged} at {edge:?} (relative to {relative:?})");

        self.register_pane_surface(dragged);
        self.after_structural_change();
        DropOutcome::Docked {
            surface,
            edge,
            relative,
        }
    }

    fn finish_session(&mut self, host: &mut dyn DockHost<C>) {
        if let Some(active) = self.session.finish() {
            self.unregister_indicators(&active.edge_indicators, &active.relative_indicators);
        }
        host.release_pointer_capture();
    }

    fn unregister_indicators(
        &mut self,
        edge_indicators: &[SurfaceId],
        relative_indicators: &AHashMap<PaneId, Vec<SurfaceId>>,
    ) {
        for &surface in edge_indicators
            .iter()
            .chain(relative_indicators.values().flatten())
        {
            let _ = self.registry.unregister(surface);
        }
    }

    fn show_relative_indicators(&mut self, target: PaneId) {
        let Some(rect) = self.arrangement.pane_rect(target) else {
            return;
        };
        let size = self.options.indicator_size;
        let indicators: Vec<SurfaceId> = DockEdge::ALL
            .into_iter()
            .map(|edge| {
                self.registry.register(
                    DropSurfaceKind::RelativeDockIndicator { pane: target, edge },
                    relative_indicator_rect(rect, edge, size),
                )
            })
            .collect();
        if let Some(active) = self.session.active_mut() {
            active.relative_indicators.insert(target, indicators);
        }
    }

    fn remove_relative_indicators(&mut self, target: PaneId) -> Vec<SurfaceId> {
        let indicators = self
            .session
            .active_mut()
            .and_then(|active| active.relative_indicators.remove(&target))
            .unwrap_or_default();
        for &surface in &indicators {
            let _ = self.registry.unregister(surface);
        }
        indicators
    }

    /// Keep indicator rectangles in step with a new arrangement.
    pub(crate) fn update_indicator_rects(&mut self) {
        let Some(active) = self.session.active_mut() else {
            return;
        };
        let area = self.area;
        let size = self.options.indicator_size;
        let margin = self.options.indicator_margin;
        for (&surface, edge) in active.edge_indicators.iter().zip(DockEdge::ALL) {
            self.registry
                .set_rect(surface, edge_indicator_rect(area, edge, size, margin));
        }
        for (target, indicators) in &active.relative_indicators {
            let Some(rect) = self.arrangement.pane_rect(*target) else {
                continue;
            };
            for (&surface, edge) in indicators.iter().zip(DockEdge::ALL) {
                self.registry
                    .set_rect(surface, relative_indicator_rect(rect, edge, size));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use egui::{Rect, pos2, vec2};

    use super::*;
    use crate::host::NoopHost;
    use crate::host::test_host::RecordingHost;
    use crate::pane::Pane;

    fn id(raw: u64) -> PaneId {
        PaneId::from_u64(raw)
    }

    /// Panes 1 (left) and 2 (right) docked in a 400x200 area: 1 at x 0..198, 2 at x 202..400.
    fn two_panes() -> DockingSurface<()> {
        let mut surface = DockingSurface::default();
        let _ = surface.arrange(Rect::from_min_size(Pos2::ZERO, vec2(400.0, 200.0)));
        for raw in [1, 2] {
            let _ = surface.add_pane(Pane::new(id(raw), ()));
        }
        surface.show_at(&mut NoopHost, id(1), DockEdge::Left);
        surface.show_at(&mut NoopHost, id(2), DockEdge::Right);
        surface
    }

    #[test]
    fn begin_floats_a_docked_pane() {
        let mut host = RecordingHost::default();
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut host, id(2), pos2(300.0, 100.0), vec2(10.0, 5.0)));
        assert!(host.captured);
        assert_eq!(surface.pane_state(id(2)), Some(PaneState::Floating));
        assert_eq!(surface.floating().get(id(2)).unwrap().position, pos2(290.0, 95.0));
        assert_eq!(surface.tree().pane_ids(), vec![id(1)]);
        // pane 1 + four edge indicators
        assert_eq!(surface.drop_surfaces().len(), 5);
        assert!(!surface.begin_drag(&mut host, id(1), pos2(0.0, 0.0), Vec2::ZERO));
    }

    #[test]
    fn refused_capture_changes_nothing() {
        let mut host = RecordingHost {
            refuse_capture: true,
            ..Default::default()
        };
        let mut surface = two_panes();
        assert!(!surface.begin_drag(&mut host, id(2), pos2(300.0, 100.0), Vec2::ZERO));
        assert!(!surface.session().is_dragging());
        assert_eq!(surface.tree().pane_ids(), vec![id(1), id(2)]);
    }

    #[test]
    fn pane_that_disallows_drag_is_refused() {
        let mut surface = two_panes();
        surface.pane_mut(id(1)).unwrap().allows_drag = false;
        assert!(!surface.begin_drag(&mut NoopHost, id(1), Pos2::ZERO, Vec2::ZERO));
    }

    #[test]
    fn entering_a_pane_shows_relative_indicators() {
        let mut host = RecordingHost::default();
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut host, id(2), pos2(300.0, 100.0), Vec2::ZERO));

        // Tree is now just pane 1, covering the whole area.
        surface.drag_move(&mut host, pos2(50.0, 50.0));
        let pane_surface = surface.drop_surfaces().surface_for_pane(id(1)).unwrap();
        assert_eq!(host.events_for(pane_surface), vec![DragEvent::Enter]);
        assert_eq!(surface.drop_surfaces().len(), 1 + 4 + 4);

        surface.drag_move(&mut host, pos2(60.0, 50.0));
        assert_eq!(
            host.events_for(pane_surface),
            vec![DragEvent::Enter, DragEvent::Over]
        );

        surface.drag_move(&mut host, pos2(1000.0, 1000.0));
        assert_eq!(
            host.events_for(pane_surface),
            vec![DragEvent::Enter, DragEvent::Over, DragEvent::Leave]
        );
        assert_eq!(surface.drop_surfaces().len(), 1 + 4);
    }

    #[test]
    fn drop_on_relative_indicator_docks_against_that_pane() {
        let mut host = RecordingHost::default();
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut host, id(2), pos2(300.0, 100.0), Vec2::ZERO));

        // Pane 1 now fills 400x200; its Bottom indicator is centred at (200, 132).
        surface.drag_move(&mut host, pos2(200.0, 132.0));
        surface.drag_move(&mut host, pos2(200.0, 132.0));
        let outcome = surface.end_drag(&mut host, pos2(200.0, 132.0)).unwrap();

        let DropOutcome::Docked { edge, relative, .. } = outcome else {
            panic!("expected a dock, got {outcome:?}");
        };
        assert_eq!((edge, relative), (DockEdge::Bottom, Some(id(1))));
        assert_eq!(surface.pane_state(id(2)), Some(PaneState::Docked));
        assert!(surface.floating().is_empty());
        assert!(!surface.session().is_dragging());
        assert!(!host.captured);
        // Only the two pane surfaces remain.
        assert_eq!(surface.drop_surfaces().len(), 2);

        let accepted: Vec<_> = host
            .notifications
            .iter()
            .filter(|n| n.event == DragEvent::Drop { accepted: true })
            .collect();
        assert_eq!(accepted.len(), 1);
    }

    #[test]
    fn drop_on_edge_indicator_docks_against_the_area() {
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut NoopHost, id(1), pos2(100.0, 100.0), Vec2::ZERO));
        // Left edge indicator: x 8..40, y 84..116.
        let outcome = surface.end_drag(&mut NoopHost, pos2(20.0, 100.0)).unwrap();
        assert!(matches!(
            outcome,
            DropOutcome::Docked {
                edge: DockEdge::Left,
                relative: None,
                ..
            }
        ));
        assert_eq!(surface.tree().pane_ids(), vec![id(1), id(2)]);
    }

    #[test]
    fn drop_on_nothing_leaves_pane_floating() {
        let mut host = RecordingHost::default();
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut host, id(2), pos2(300.0, 100.0), vec2(1.0, 1.0)));
        surface.drag_move(&mut host, pos2(50.0, 50.0));
        let pane_surface = surface.drop_surfaces().surface_for_pane(id(1)).unwrap();

        let outcome = surface.end_drag(&mut host, pos2(900.0, 900.0));
        assert_eq!(outcome, Some(DropOutcome::Floating));
        assert_eq!(surface.pane_state(id(2)), Some(PaneState::Floating));
        assert_eq!(surface.floating().get(id(2)).unwrap().position, pos2(899.0, 899.0));
        assert_eq!(
            host.events_for(pane_surface),
            vec![DragEvent::Enter, DragEvent::Leave]
        );
        assert_eq!(surface.drop_surfaces().len(), 1);
        assert_eq!(surface.end_drag(&mut host, Pos2::ZERO), None);
    }

    #[test]
    fn host_can_refuse_a_drop() {
        let mut host = RecordingHost {
            refuse_edge_drops: true,
            ..Default::default()
        };
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut host, id(1), pos2(100.0, 100.0), Vec2::ZERO));
        let outcome = surface.end_drag(&mut host, pos2(20.0, 100.0));

        assert_eq!(outcome, Some(DropOutcome::Floating));
        assert_eq!(surface.pane_state(id(1)), Some(PaneState::Floating));
        assert_eq!(surface.tree().pane_ids(), vec![id(2)]);
        assert!(host.notifications.iter().any(|n| n.event == DragEvent::Drop { accepted: false }));
        assert!(!host.notifications.iter().any(|n| n.event == DragEvent::Drop { accepted: true }));
        assert!(!host.captured);
    }

    #[test]
    fn cancel_keeps_pane_floating() {
        let mut host = RecordingHost::default();
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut host, id(2), pos2(300.0, 100.0), Vec2::ZERO));
        surface.drag_move(&mut host, pos2(50.0, 50.0));
        surface.cancel_drag(&mut host);
        assert!(!surface.session().is_dragging());
        assert!(!host.captured);
        assert_eq!(surface.pane_state(id(2)), Some(PaneState::Floating));
        assert_eq!(surface.drop_surfaces().len(), 1);
        assert_eq!(
            host.notifications.last().map(|n| n.event),
            Some(DragEvent::Leave)
        );
    }

    #[test]
    fn dragging_a_floating_pane_brings_it_to_front() {
        let mut surface = two_panes();
        surface.float(id(1), pos2(0.0, 0.0));
        surface.float(id(2), pos2(10.0, 10.0));
        assert_eq!(surface.floating().z_order(), &[id(1), id(2)]);
        assert!(surface.begin_drag(&mut NoopHost, id(1), pos2(5.0, 5.0), Vec2::ZERO));
        assert_eq!(surface.floating().z_order(), &[id(2), id(1)]);
        assert_eq!(surface.end_drag(&mut NoopHost, pos2(-50.0, -50.0)), Some(DropOutcome::Floating));
    }

    #[test]
    fn hiding_the_dragged_pane_cancels_the_drag() {
        let mut host = RecordingHost::default();
        let mut surface = two_panes();
        assert!(surface.begin_drag(&mut host, id(2), pos2(300.0, 100.0), Vec2::ZERO));
        surface.hide(&mut host, id(2));
        assert!(!surface.session().is_dragging());
        assert!(!host.captured);
        assert_eq!(surface.pane_state(id(2)), Some(PaneState::Hidden));
        assert_eq!(surface.drop_surfaces().len(), 1);
    }
}

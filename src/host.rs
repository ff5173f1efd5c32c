use egui::{Pos2, Vec2};

use crate::drop_surface::{DropSurfaceKind, SurfaceId};
use crate::pane::PaneId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,

    /// The pointer was released over the surface. `accepted` is true for the surface that took the pane.
    Drop { accepted: bool },
}

/// One drag-protocol callback, delivered to [`DockHost::drag_notification`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragNotification {
    pub surface: SurfaceId,
    pub kind: DropSurfaceKind,

    /// The pane being dragged.
    pub pane: PaneId,
    pub event: DragEvent,
    pub pointer: Pos2,
}

/// What the docking core needs from the application around it.
///
/// Every method has a do-nothing default, so implement only what you use.
pub trait DockHost<C> {
    /// A pane became visible (shown, docked or floated) or stopped being visible.
    fn pane_visibility_changed(&mut self, pane: PaneId, visible: bool) {
        let _ = (pane, visible);
    }

    /// Smallest size the content can be laid out at.
    fn min_content_size(&mut self, content: &C) -> Vec2 {
        let _ = content;
        Vec2::ZERO
    }

    /// Grab the pointer for a drag. Returning `false` refuses the drag.
    fn acquire_pointer_capture(&mut self) -> bool {
        true
    }

    fn release_pointer_capture(&mut self) {}

    /// Final say on a drop the docking core is willing to take.
    ///
    /// Asked on release for each surface under the pointer that would accept `pane`, in
    /// registration order, before its `Drop` notification. Returning `false` passes the drop on
    /// to the next surface; if every one is refused the pane stays floating.
    fn accept_drop(&mut self, pane: PaneId, kind: DropSurfaceKind) -> bool {
        let _ = (pane, kind);
        true
    }

    /// Enter/over/leave/drop callbacks for drop surfaces, typically used to paint hover feedback.
    fn drag_notification(&mut self, notification: &DragNotification) {
        let _ = notification;
    }
}

/// A [`DockHost`] that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHost;

impl<C> DockHost<C> for NoopHost {}

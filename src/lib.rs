//! Docking layout engine.
//!
//! Panes are rectangular content holders that can be docked into a [`CompositionTree`],
//! floated in a [`FloatingContainer`], or hidden. A [`DockingSurface`] owns all three and
//! drives the lifecycle, the arrangement into screen rectangles, drag-and-drop re-docking
//! and (with the `serde` feature) layout persistence.
//!
//! The crate never renders anything: the application implements [`DockHost`] to learn about
//! visibility changes and drag feedback, and paints the [`Arrangement`] however it likes.
//!
//! ```
//! use pane_docking::{DockEdge, DockingSurface, NoopHost, Pane, PaneId};
//!
//! let mut surface = DockingSurface::default();
//! surface.add_pane(Pane::new(PaneId::from_u64(1), "explorer"));
//! surface.add_pane(Pane::new(PaneId::from_u64(2), "editor"));
//! surface.show_at(&mut NoopHost, PaneId::from_u64(1), DockEdge::Left);
//! surface.show_at(&mut NoopHost, PaneId::from_u64(2), DockEdge::Right);
//!
//! let area = egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(400.0, 200.0));
//! let arrangement = surface.arrange(area);
//! assert_eq!(arrangement.panes().count(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod arrange;
pub mod dock_builder;
pub mod drag;
pub mod drop_surface;
pub mod floating;
pub mod host;
pub mod options;
pub mod pane;
#[cfg(feature = "serde")]
pub mod persistence;
pub mod session;
pub mod surface;
pub mod tree;

pub use arrange::{Arrangement, Occupant, Region, SeparatorRef, arrange};
pub use dock_builder::{DockBuilder, DockNodeId};
pub use drag::DropOutcome;
pub use drop_surface::{
    DropSurface, DropSurfaceKind, DropSurfaceRegistry, SurfaceId, edge_indicator_rect,
    relative_indicator_rect,
};
pub use floating::{FloatingContainer, FloatingManager};
pub use host::{DockHost, DragEvent, DragNotification, NoopHost};
pub use options::DockingOptions;
pub use pane::{DockEdge, Pane, PaneId, PaneState};
pub use session::DragSession;
pub use surface::DockingSurface;
pub use tree::{
    AutoPlacement, CompositionNode, CompositionTree, FACTOR_EPSILON, NodeId, Orientation, Split,
    SplitChild, TreeShape,
};

#[cfg(feature = "serde")]
pub use persistence::{
    ChildElement, ChildType, ContentFactory, DockablePaneElement, LAYOUT_DOCUMENT_VERSION,
    LayoutDocument, LayoutError, NodePath, PersistedState, SimpleContentFactory,
};

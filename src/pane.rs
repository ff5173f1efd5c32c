use egui::{Pos2, Vec2};

/// Stable identity of a [`Pane`] within one [`crate::DockingSurface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PaneId(u64);

impl PaneId {
    pub const fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// The side a pane is attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DockEdge {
    Left,
    #[default]
    Right,
    Top,
    Bottom,
}

impl DockEdge {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];

    /// The split orientation this edge stacks along.
    ///
    /// `Top`/`Bottom` stack children vertically inside a `Horizontal` split,
    /// `Left`/`Right` place them side by side inside a `Vertical` split.
    pub fn orientation(self) -> crate::Orientation {
        match self {
            Self::Top | Self::Bottom => crate::Orientation::Horizontal,
            Self::Left | Self::Right => crate::Orientation::Vertical,
        }
    }

    /// `true` if a pane docked on this edge goes *before* its neighbour.
    pub fn is_leading(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }
}

/// Lifecycle of a pane.
///
/// ```text
/// Hidden ──show──▶ Docked ──drag-out / float──▶ Floating
///   ▲                │  ▲                          │
///   └──hide/close────┘  └──────drop / redock───────┘
///   ▲                                              │
///   └──────────────────force-close─────────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaneState {
    #[default]
    Hidden,
    Docked,
    Floating,
}

impl PaneState {
    pub fn can_transition_to(self, next: Self) -> bool {
        use PaneState::{Docked, Floating, Hidden};
        matches!(
            (self, next),
            (Hidden, Docked) | (Docked, Hidden) | (Docked, Floating) | (Floating, Docked) | (Floating, Hidden)
        )
    }
}

/// A rectangular content holder.
///
/// `C` is the application's content; the docking core never looks inside it.
#[derive(Clone, Debug)]
pub struct Pane<C> {
    id: PaneId,
    pub content: C,

    /// Last concrete size this pane was arranged at (zero until first arranged).
    pub size: Vec2,

    /// Host-provided minimum content size, captured when the pane is shown.
    pub min_size: Vec2,

    pub allows_drag: bool,

    /// Where the floating container sat the last time this pane floated.
    pub floating_position: Pos2,

    /// Size of the floating container the last time this pane floated.
    pub floating_size: Vec2,

    dock_edge: DockEdge,
    state: PaneState,
}

impl<C> Pane<C> {
    pub fn new(id: PaneId, content: C) -> Self {
        Self {
            id,
            content,
            size: Vec2::ZERO,
            min_size: Vec2::ZERO,
            allows_drag: true,
            floating_position: Pos2::ZERO,
            floating_size: Vec2::ZERO,
            dock_edge: DockEdge::default(),
            state: PaneState::Hidden,
        }
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn dock_edge(&self) -> DockEdge {
        self.dock_edge
    }

    pub fn state(&self) -> PaneState {
        self.state
    }

    pub fn is_docked(&self) -> bool {
        self.state == PaneState::Docked
    }

    /// Squared diagonal, used to pick the biggest pane for auto-placement.
    pub(crate) fn hypot_squared(&self) -> f32 {
        self.size.x * self.size.x + self.size.y * self.size.y
    }

    pub(crate) fn set_dock_edge(&mut self, edge: DockEdge) {
        self.dock_edge = edge;
    }

    /// Move to `next`.
    ///
    /// # Panics
    /// On any transition not drawn in the [`PaneState`] diagram.
    pub(crate) fn transition(&mut self, next: PaneState) {
        assert!(
            self.state.can_transition_to(next),
            "pane {}: invalid lifecycle transition {:?} -> {next:?}",
            self.id,
            self.state
        );
        log::trace!("pane {}: {:?} -> {next:?}", self.id, self.state);
        self.state = next;
    }

    /// Swap the content for `f(content)`, keeping everything else. `None` drops the pane.
    pub(crate) fn try_map_content<D>(self, f: impl FnOnce(C) -> Option<D>) -> Option<Pane<D>> {
        Some(Pane {
            id: self.id,
            content: f(self.content)?,
            size: self.size,
            min_size: self.min_size,
            allows_drag: self.allows_drag,
            floating_position: self.floating_position,
            floating_size: self.floating_size,
            dock_edge: self.dock_edge,
            state: self.state,
        })
    }

    /// Restore a pane straight into `state`, bypassing the lifecycle checks.
    ///
    /// Only layout loading uses this, since a freshly restored pane has no prior state.
    pub(crate) fn restored(mut self, dock_edge: DockEdge, state: PaneState) -> Self {
        self.dock_edge = dock_edge;
        self.state = state;
        self
    }
}

//! [`DockingSurface`]: a composition tree plus the floating containers, hidden panes and drop
//! surfaces around it.

use ahash::AHashMap;
use egui::{Pos2, Rect};

use crate::arrange::{Arrangement, SeparatorRef, arrange};
use crate::drop_surface::{DropSurfaceKind, DropSurfaceRegistry, SurfaceId};
use crate::floating::{FloatingContainer, FloatingManager};
use crate::host::DockHost;
use crate::options::DockingOptions;
use crate::pane::{DockEdge, Pane, PaneId, PaneState};
use crate::session::DragSession;
use crate::tree::{AutoPlacement, CompositionTree};

/// Owns every pane of one docking area, whatever its lifecycle state.
///
/// All mutations go through here: after each structural change the tree is normalized
/// (see [`DockingOptions::normalize_on_mutation`]) and re-arranged into the last area given
/// to [`Self::arrange`].
#[derive(Debug)]
pub struct DockingSurface<C> {
    pub(crate) tree: CompositionTree<C>,
    pub(crate) floating: FloatingManager<C>,
    pub(crate) hidden: Vec<Pane<C>>,
    pub(crate) registry: DropSurfaceRegistry,
    pub(crate) pane_surfaces: AHashMap<PaneId, SurfaceId>,
    pub(crate) session: DragSession,
    pub(crate) options: DockingOptions,
    pub(crate) area: Rect,
    pub(crate) arrangement: Arrangement,
}

impl<C> Default for DockingSurface<C> {
    fn default() -> Self {
        Self::new(DockingOptions::default())
    }
}

impl<C> DockingSurface<C> {
    pub fn new(options: DockingOptions) -> Self {
        Self {
            tree: CompositionTree::empty(),
            floating: FloatingManager::default(),
            hidden: Vec::new(),
            registry: DropSurfaceRegistry::default(),
            pane_surfaces: AHashMap::new(),
            session: DragSession::default(),
            options,
            area: Rect::NOTHING,
            arrangement: Arrangement::default(),
        }
    }

    /// Wrap an already built tree, e.g. from [`crate::DockBuilder`].
    pub fn from_tree(tree: CompositionTree<C>, options: DockingOptions) -> Self {
        let mut surface = Self::new(options);
        surface.tree = tree;
        for pane in surface.tree.pane_ids() {
            surface.register_pane_surface(pane);
        }
        surface.after_structural_change();
        surface
    }

    pub fn tree(&self) -> &CompositionTree<C> {
        &self.tree
    }

    pub fn floating(&self) -> &FloatingManager<C> {
        &self.floating
    }

    /// Panes on the hidden shelf, oldest first.
    pub fn hidden(&self) -> impl Iterator<Item = &Pane<C>> + '_ {
        self.hidden.iter()
    }

    pub fn drop_surfaces(&self) -> &DropSurfaceRegistry {
        &self.registry
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn options(&self) -> &DockingOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DockingOptions {
        &mut self.options
    }

    /// The last arrangement of the docked panes.
    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn pane(&self, pane: PaneId) -> Option<&Pane<C>> {
        self.tree
            .pane(pane)
            .or_else(|| self.floating.get(pane).map(|c| &c.pane))
            .or_else(|| self.hidden.iter().find(|p| p.id() == pane))
    }

    pub fn pane_mut(&mut self, pane: PaneId) -> Option<&mut Pane<C>> {
        if self.tree.contains(pane) {
            return self.tree.pane_mut(pane);
        }
        if let Some(container) = self.floating.get_mut(pane) {
            return Some(&mut container.pane);
        }
        self.hidden.iter_mut().find(|p| p.id() == pane)
    }

    pub fn pane_state(&self, pane: PaneId) -> Option<PaneState> {
        self.pane(pane).map(Pane::state)
    }

    pub fn contains(&self, pane: PaneId) -> bool {
        self.pane(pane).is_some()
    }

    /// Every pane the surface knows about: docked (traversal order), floating (back to front),
    /// then hidden.
    pub fn pane_ids(&self) -> Vec<PaneId> {
        let mut ids = self.tree.pane_ids();
        ids.extend(self.floating.z_order().iter().copied());
        ids.extend(self.hidden.iter().map(Pane::id));
        ids
    }

    /// Hand a new, hidden pane to the surface. Show it with [`Self::show`] and friends.
    ///
    /// # Panics
    /// If the pane is not hidden, or its id is already in use.
    pub fn add_pane(&mut self, pane: Pane<C>) -> PaneId {
        let id = pane.id();
        assert!(!self.contains(id), "add_pane: pane {id} already exists");
        assert!(
            pane.state() == PaneState::Hidden,
            "add_pane: pane {id} must start hidden, found {:?}",
            pane.state()
        );
        self.hidden.push(pane);
        id
    }

    /// Dock a hidden pane wherever there is most room.
    pub fn show(&mut self, host: &mut dyn DockHost<C>, pane: PaneId) -> AutoPlacement {
        let pane = self.take_hidden(host, pane, "show");
        let id = pane.id();
        let placement = self.tree.auto_insert(pane);
        self.finish_show(host, id);
        placement
    }

    /// Dock a hidden pane against an edge of the whole docking area.
    pub fn show_at(&mut self, host: &mut dyn DockHost<C>, pane: PaneId, edge: DockEdge) {
        let pane = self.take_hidden(host, pane, "show_at");
        let id = pane.id();
        self.tree.insert(pane, edge);
        self.finish_show(host, id);
    }

    /// Dock a hidden pane against an edge of the docked pane `relative`.
    pub fn show_relative(
        &mut self,
        host: &mut dyn DockHost<C>,
        pane: PaneId,
        relative: PaneId,
        edge: DockEdge,
    ) {
        assert!(
            self.tree.contains(relative),
            "show_relative: relative pane {relative} is not docked"
        );
        let pane = self.take_hidden(host, pane, "show_relative");
        let id = pane.id();
        self.tree.insert_relative(pane, relative, edge);
        self.finish_show(host, id);
    }

    /// Move a docked or floating pane to the hidden shelf.
    pub fn hide(&mut self, host: &mut dyn DockHost<C>, pane: PaneId) {
        let mut pane = self.detach_visible(host, pane, "hide");
        let id = pane.id();
        pane.transition(PaneState::Hidden);
        self.hidden.push(pane);
        host.pane_visibility_changed(id, false);
    }

    /// Detach a pane for good and hand it back.
    pub fn close(&mut self, host: &mut dyn DockHost<C>, pane: PaneId) -> Pane<C> {
        if let Some(index) = self.hidden.iter().position(|p| p.id() == pane) {
            log::debug!("close hidden pane {pane}");
            return self.hidden.remove(index);
        }
        let mut pane = self.detach_visible(host, pane, "close");
        log::debug!("close pane {}", pane.id());
        pane.transition(PaneState::Hidden);
        host.pane_visibility_changed(pane.id(), false);
        pane
    }

    /// Take a docked pane out of the tree into a floating container at `position`.
    pub fn float(&mut self, pane: PaneId, position: Pos2) {
        assert!(self.tree.contains(pane), "float: pane {pane} is not docked");
        self.float_docked(pane, position);
        self.after_structural_change();
    }

    /// Dock a floating pane back at its remembered dock edge.
    pub fn redock(&mut self, host: &mut dyn DockHost<C>, pane: PaneId) {
        if self.session.active_pane() == Some(pane) {
            self.cancel_drag(host);
        }
        let Some(container) = self.floating.remove(pane) else {
            panic!("redock: pane {pane} is not floating");
        };
        let pane = into_remembered_pane(container);
        let edge = pane.dock_edge();
        let id = pane.id();
        self.tree.insert(pane, edge);
        self.register_pane_surface(id);
        self.after_structural_change();
    }

    /// Move a floating container.
    pub fn move_floating(&mut self, pane: PaneId, position: Pos2) -> bool {
        match self.floating.get_mut(pane) {
            Some(container) => {
                container.position = position;
                true
            }
            None => false,
        }
    }

    /// Lay the docked panes out inside `area`, and remember `area` for later mutations.
    pub fn arrange(&mut self, area: Rect) -> &Arrangement {
        self.area = area;
        self.rearrange();
        &self.arrangement
    }

    /// Drag a separator by `delta` points along its split's main axis.
    ///
    /// Not a structural change: factors are not normalized afterwards.
    pub fn drag_separator(&mut self, separator: SeparatorRef, delta: f32) -> bool {
        let moved = self.tree.resize_separator(
            separator.split,
            separator.index,
            delta,
            self.options.min_pane_extent,
        );
        if moved {
            self.rearrange();
        }
        moved
    }

    /// Remove `pane` from the tree and give it a floating container. No normalization.
    pub(crate) fn float_docked(&mut self, pane: PaneId, position: Pos2) {
        let mut pane = self.tree.remove(pane);
        let id = pane.id();
        log::debug!("float pane {id} at {position:?}");
        self.forget_pane_surfaces(id);
        let size = self.options.floating_size_for(pane.size);
        pane.transition(PaneState::Floating);
        pane.floating_position = position;
        pane.floating_size = size;
        self.floating.insert(FloatingContainer {
            pane,
            position,
            size,
        });
    }

    pub(crate) fn after_structural_change(&mut self) {
        if self.options.normalize_on_mutation {
            self.tree.normalize_all(self.options.min_pane_extent);
        }
        self.rearrange();
        debug_assert!(
            self.tree.integrity_issues().is_empty(),
            "docking surface: tree integrity failed: {:?}",
            self.tree.integrity_issues()
        );
    }

    pub(crate) fn rearrange(&mut self) {
        if !self.area.is_positive() {
            self.arrangement = Arrangement::default();
            return;
        }
        self.arrangement = arrange(&self.tree, self.area, &self.options);
        self.tree.apply_arrangement(&self.arrangement);
        for (pane, rect) in self.arrangement.panes() {
            if let Some(&surface) = self.pane_surfaces.get(&pane) {
                self.registry.set_rect(surface, rect);
            }
        }
        self.update_indicator_rects();
    }

    pub(crate) fn register_pane_surface(&mut self, pane: PaneId) {
        let rect = self.arrangement.pane_rect(pane).unwrap_or(Rect::NOTHING);
        let surface = self.registry.register(DropSurfaceKind::Pane(pane), rect);
        self.pane_surfaces.insert(pane, surface);
    }

    /// Unregister the pane's own drop surface and any relative indicators shown around it.
    pub(crate) fn forget_pane_surfaces(&mut self, pane: PaneId) {
        let mut gone = Vec::new();
        if let Some(surface) = self.pane_surfaces.remove(&pane) {
            let _ = self.registry.unregister(surface);
            gone.push(surface);
        }
        if let Some(active) = self.session.active_mut() {
            if let Some(indicators) = active.relative_indicators.remove(&pane) {
                for surface in indicators {
                    let _ = self.registry.unregister(surface);
                    gone.push(surface);
                }
            }
            active.under_pointer.retain(|s| !gone.contains(s));
        }
    }

    fn take_hidden(&mut self, host: &mut dyn DockHost<C>, pane: PaneId, op: &str) -> Pane<C> {
        let Some(index) = self.hidden.iter().position(|p| p.id() == pane) else {
            panic!("{op}: pane {pane} is not hidden");
        };
        let mut pane = self.hidden.remove(index);
        pane.min_size = host.min_content_size(&pane.content);
        pane
    }

    fn finish_show(&mut self, host: &mut dyn DockHost<C>, pane: PaneId) {
        self.register_pane_surface(pane);
        self.after_structural_change();
        host.pane_visibility_changed(pane, true);
    }

    /// Take a docked or floating pane out of wherever it lives. The pane keeps its state.
    fn detach_visible(&mut self, host: &mut dyn DockHost<C>, pane: PaneId, op: &str) -> Pane<C> {
        if self.session.active_pane() == Some(pane) {
            self.cancel_drag(host);
        }
        if self.tree.contains(pane) {
            let removed = self.tree.remove(pane);
            self.forget_pane_surfaces(pane);
            self.after_structural_change();
            removed
        } else if let Some(container) = self.floating.remove(pane) {
            into_remembered_pane(container)
        } else {
            panic!("{op}: pane {pane} is not visible");
        }
    }
}

/// Unwrap a floating container, remembering where it was.
fn into_remembered_pane<C>(container: FloatingContainer<C>) -> Pane<C> {
    let mut pane = container.pane;
    pane.floating_position = container.position;
    pane.floating_size = container.size;
    pane
}

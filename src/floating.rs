use egui::{Pos2, Rect, Vec2};

use crate::pane::{Pane, PaneId};

/// A detached host for one pane that is not part of the composition tree.
#[derive(Clone, Debug)]
pub struct FloatingContainer<C> {
    pub pane: Pane<C>,
    pub position: Pos2,
    pub size: Vec2,
}

impl<C> FloatingContainer<C> {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }
}

/// Floating containers of one docking surface, with their stacking order.
#[derive(Clone, Debug)]
pub struct FloatingManager<C> {
    containers: Vec<FloatingContainer<C>>,

    /// Back to front.
    z_order: Vec<PaneId>,
}

impl<C> Default for FloatingManager<C> {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            z_order: Vec::new(),
        }
    }
}

impl<C> FloatingManager<C> {
    /// Add a container on top of all others.
    ///
    /// # Panics
    /// If a container for the same pane already exists.
    pub(crate) fn insert(&mut self, container: FloatingContainer<C>) {
        let id = container.pane.id();
        assert!(
            !self.contains(id),
            "floating: pane {id} already has a floating container"
        );
        self.containers.push(container);
        self.z_order.push(id);
    }

    pub(crate) fn remove(&mut self, pane: PaneId) -> Option<FloatingContainer<C>> {
        let index = self.containers.iter().position(|c| c.pane.id() == pane)?;
        self.z_order.retain(|&id| id != pane);
        Some(self.containers.remove(index))
    }

    pub fn bring_to_front(&mut self, pane: PaneId) {
        if !self.contains(pane) {
            return;
        }
        self.z_order.retain(|&id| id != pane);
        self.z_order.push(pane);
    }

    pub fn contains(&self, pane: PaneId) -> bool {
        self.containers.iter().any(|c| c.pane.id() == pane)
    }

    pub fn get(&self, pane: PaneId) -> Option<&FloatingContainer<C>> {
        self.containers.iter().find(|c| c.pane.id() == pane)
    }

    pub fn get_mut(&mut self, pane: PaneId) -> Option<&mut FloatingContainer<C>> {
        self.containers.iter_mut().find(|c| c.pane.id() == pane)
    }

    /// Containers from back to front.
    pub fn iter(&self) -> impl Iterator<Item = &FloatingContainer<C>> + '_ {
        self.z_order.iter().filter_map(|&id| self.get(id))
    }

    pub fn z_order(&self) -> &[PaneId] {
        &self.z_order
    }

    /// The front-most container under `pos`.
    pub fn topmost_at(&self, pos: Pos2) -> Option<PaneId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .find(|&id| self.get(id).is_some_and(|c| c.rect().contains(pos)))
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub(crate) fn drain(&mut self) -> Vec<FloatingContainer<C>> {
        let mut out = Vec::with_capacity(self.containers.len());
        for id in std::mem::take(&mut self.z_order) {
            if let Some(index) = self.containers.iter().position(|c| c.pane.id() == id) {
                out.push(self.containers.remove(index));
            }
        }
        out.append(&mut self.containers);
        out
    }
}

#[cfg(test)]
mod tests {
    use egui::pos2;

    use super::*;
    use crate::pane::PaneState;

    fn container(id: u64, x: f32) -> FloatingContainer<()> {
        let mut pane = Pane::new(PaneId::from_u64(id), ());
        pane.transition(PaneState::Docked);
        pane.transition(PaneState::Floating);
        FloatingContainer {
            pane,
            position: pos2(x, 0.0),
            size: Vec2::splat(100.0),
        }
    }

    fn ids(manager: &FloatingManager<()>) -> Vec<u64> {
        manager.z_order().iter().map(|id| id.get()).collect()
    }

    #[test]
    fn bring_to_front_reorders() {
        let mut manager = FloatingManager::default();
        manager.insert(container(1, 0.0));
        manager.insert(container(2, 50.0));
        manager.insert(container(3, 500.0));
        assert_eq!(ids(&manager), vec![1, 2, 3]);
        assert_eq!(manager.topmost_at(pos2(75.0, 10.0)), Some(PaneId::from_u64(2)));

        manager.bring_to_front(PaneId::from_u64(1));
        assert_eq!(ids(&manager), vec![2, 3, 1]);
        assert_eq!(manager.topmost_at(pos2(75.0, 10.0)), Some(PaneId::from_u64(1)));

        manager.bring_to_front(PaneId::from_u64(9));
        assert_eq!(ids(&manager), vec![2, 3, 1]);
    }

    #[test]
    fn remove_and_drain() {
        let mut manager = FloatingManager::default();
        manager.insert(container(1, 0.0));
        manager.insert(container(2, 0.0));
        manager.bring_to_front(PaneId::from_u64(1));

        let removed = manager.remove(PaneId::from_u64(2)).unwrap();
        assert_eq!(removed.pane.id(), PaneId::from_u64(2));
        assert!(manager.remove(PaneId::from_u64(2)).is_none());
        assert_eq!(ids(&manager), vec![1]);

        manager.insert(container(3, 0.0));
        let drained: Vec<u64> = manager.drain().iter().map(|c| c.pane.id().get()).collect();
        assert_eq!(drained, vec![1, 3]);
        assert!(manager.is_empty());
    }

    #[test]
    #[should_panic(expected = "already has a floating container")]
    fn duplicate_container_panics() {
        let mut manager = FloatingManager::default();
        manager.insert(container(1, 0.0));
        manager.insert(container(1, 0.0));
    }
}

use egui::Vec2;

/// Options for [`crate::DockingSurface`].
#[derive(Clone, Debug)]
pub struct DockingOptions {
    /// Smallest main-axis extent (in points) a docked pane is given when there is room for it.
    ///
    /// Used as the space-factor floor when normalizing, and as the per-slot floor when arranging.
    pub min_pane_extent: f32,

    /// Thickness (in points) of the separator between two adjacent children of a split.
    pub separator_thickness: f32,

    /// Size of a floating container for a pane that has never been arranged.
    pub default_floating_size: Vec2,

    /// Side length (in points) of a docking indicator square.
    pub indicator_size: f32,

    /// Gap (in points) between the docking area border and an edge indicator.
    pub indicator_margin: f32,

    /// If true, recompute space factors after every structural mutation.
    ///
    /// Disable to keep factors exactly as the insertion/removal algorithms leave them
    /// (handy when driving the surface from tests or a layout editor).
    pub normalize_on_mutation: bool,
}

impl Default for DockingOptions {
    fn default() -> Self {
        Self {
            min_pane_extent: 50.0,
            separator_thickness: 4.0,
            default_floating_size: Vec2::new(320.0, 240.0),
            indicator_size: 32.0,
            indicator_margin: 8.0,
            normalize_on_mutation: true,
        }
    }
}

impl DockingOptions {
    /// Floating container size for a pane last arranged at `last_size`.
    pub(crate) fn floating_size_for(&self, last_size: Vec2) -> Vec2 {
        if last_size.x > 0.0 && last_size.y > 0.0 {
            last_size
        } else {
            self.default_floating_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmeasured_panes_float_at_default_size() {
        let opt = DockingOptions::default();
        assert_eq!(opt.floating_size_for(Vec2::ZERO), Vec2::new(320.0, 240.0));
        assert_eq!(opt.floating_size_for(Vec2::new(0.0, 80.0)), opt.default_floating_size);
    }

    #[test]
    fn measured_panes_keep_their_size() {
        let opt = DockingOptions {
            default_floating_size: Vec2::splat(10.0),
            ..Default::default()
        };
        assert_eq!(opt.floating_size_for(Vec2::new(200.0, 90.0)), Vec2::new(200.0, 90.0));
    }
}

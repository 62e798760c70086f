use eframe::egui::{Rect, Vec2};

use super::super::sim::{ChargeMode, Simulation};
use super::super::{DragState, ViewModel};

impl ViewModel {
    /// Replace the solver when a force-affecting input changed. The old
    /// instance is dropped before the new one exists; in-flight drags are
    /// cancelled on the same path.
    pub(in crate::app) fn ensure_simulation(&mut self, rect: Rect) {
        if !self.simulation_dirty {
            return;
        }

        // Surface not laid out yet; keep the dirty flag and retry next frame.
        if rect.width() < 1.0 || rect.height() < 1.0 {
            return;
        }

        self.cancel_interaction();
        self.hovered = None;
        self.highlight = None;
        self.simulation = None;

        if !self.snapshot.is_empty() {
            // Viewport dimensions are re-queried on every (re)construction.
            self.simulation = Simulation::new(&self.snapshot, rect.size(), ChargeMode::Auto);
            if !self.view_seeded {
                self.zoom = initial_zoom(rect.size(), self.snapshot.nodes.len());
                self.pan = Vec2::ZERO;
                self.view_seeded = true;
            }
        }

        self.drag = DragState::Idle;
        self.simulation_dirty = false;
    }
}

/// Fit the expected settled extent into the surface, within the zoom bounds.
fn initial_zoom(viewport: Vec2, node_count: usize) -> f32 {
    let expected_extent = (node_count as f32).sqrt() * 120.0;
    (viewport.x.min(viewport.y) / expected_extent.max(1.0)).clamp(0.1, 1.0)
}

#[cfg(test)]
mod tests {
    use super::super::super::ViewModel;
    use super::*;
    use crate::model::{SnapshotFile, sample_workspace};
    use eframe::egui::{pos2, vec2};

    fn rect() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
    }

    #[test]
    fn empty_snapshot_never_constructs_a_solver() {
        let mut model = ViewModel::new(SnapshotFile::default(), None);
        model.ensure_simulation(rect());
        assert!(model.simulation.is_none());
        assert!(!model.simulation_dirty);
    }

    #[test]
    fn zero_size_surface_defers_construction() {
        let mut model = ViewModel::new(sample_workspace(), None);
        model.ensure_simulation(Rect::from_min_size(pos2(0.0, 0.0), vec2(0.0, 0.0)));
        assert!(model.simulation.is_none());
        assert!(model.simulation_dirty);

        model.ensure_simulation(rect());
        assert!(model.simulation.is_some());
        assert!(!model.simulation_dirty);
    }

    #[test]
    fn marking_dirty_replaces_the_solver_and_clears_interaction() {
        let mut model = ViewModel::new(sample_workspace(), None);
        model.ensure_simulation(rect());

        model.begin_drag(0);
        assert_ne!(model.drag, DragState::Idle);

        model.simulation_dirty = true;
        model.ensure_simulation(rect());
        assert_eq!(model.drag, DragState::Idle);
        assert!(model.simulation.is_some());
        assert!(model.highlight.is_none());
    }

    #[test]
    fn initial_zoom_stays_within_bounds() {
        assert_eq!(initial_zoom(vec2(800.0, 600.0), 1), 1.0);
        let tight = initial_zoom(vec2(200.0, 200.0), 400);
        assert!((0.1..=1.0).contains(&tight));
    }
}

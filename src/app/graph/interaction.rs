use eframe::egui::{self, Rect, Ui, Vec2};

use super::super::highlight::active_set;
use super::super::render_utils::screen_to_world;
use super::super::{DragState, ViewModel};

pub(in crate::app) const ZOOM_MIN: f32 = 0.1;
pub(in crate::app) const ZOOM_MAX: f32 = 4.0;

/// One scroll step applied to the current scale, clamped to the zoom bounds.
fn zoomed(current: f32, scroll: f32) -> f32 {
    let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
    (current * zoom_factor).clamp(ZOOM_MIN, ZOOM_MAX)
}

impl ViewModel {
    /// Scroll zoom anchored at the pointer: the world point under the cursor
    /// stays put. Affects only the view transform, never the simulation.
    pub(in crate::app) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        self.zoom = zoomed(self.zoom, scroll);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_secondary_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Drag start on a node: pin it at its current position and reheat the
    /// solver so the layout follows the pointer.
    pub(in crate::app) fn begin_drag(&mut self, node: usize) {
        let Some(simulation) = self.simulation.as_mut() else {
            return;
        };
        let Some(&position) = simulation.positions().get(node) else {
            return;
        };

        simulation.pin(node, position);
        simulation.reheat();
        self.drag = DragState::Node { node };
    }

    pub(in crate::app) fn update_drag(&mut self, pointer_world: Vec2) {
        let DragState::Node { node } = self.drag else {
            return;
        };
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.pin(node, pointer_world);
        }
    }

    /// Drag end: release the pin and let alpha relax back toward zero.
    pub(in crate::app) fn end_drag(&mut self) {
        if let DragState::Node { node } = self.drag
            && let Some(simulation) = self.simulation.as_mut()
        {
            simulation.clear_pin(node);
            simulation.relax();
        }
        self.drag = DragState::Idle;
    }

    /// Abort any gesture. Runs on Escape and on solver replacement; must
    /// never leave a node permanently pinned.
    pub(in crate::app) fn cancel_interaction(&mut self) {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.clear_all_pins();
            if self.drag != DragState::Idle {
                simulation.relax();
            }
        }
        self.drag = DragState::Idle;
    }

    /// Hover transition: recompute the active set on enter, keep the stale
    /// set on leave so the dim animation can ease back out.
    pub(in crate::app) fn update_hover(&mut self, hovered: Option<usize>) {
        if self.hovered == hovered {
            return;
        }

        self.hovered = hovered;
        if let Some(node) = hovered {
            self.highlight = Some(active_set(node, &self.snapshot.endpoints));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::ViewModel;
    use super::*;
    use crate::model::sample_workspace;
    use eframe::egui::{pos2, vec2};
    use std::collections::HashSet;

    fn ready_model() -> ViewModel {
        let mut model = ViewModel::new(sample_workspace(), None);
        model.ensure_simulation(Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0)));
        assert!(model.simulation.is_some());
        model
    }

    fn step(model: &mut ViewModel, ticks: usize) {
        let simulation = model.simulation.as_mut().unwrap();
        for _ in 0..ticks {
            simulation.step();
        }
    }

    #[test]
    fn zoom_respects_its_bounds() {
        let mut zoom = 1.0;
        for _ in 0..200 {
            zoom = zoomed(zoom, 500.0);
        }
        assert_eq!(zoom, ZOOM_MAX);

        for _ in 0..400 {
            zoom = zoomed(zoom, -500.0);
        }
        assert_eq!(zoom, ZOOM_MIN);
    }

    #[test]
    fn drag_pins_the_node_to_the_pointer() {
        let mut model = ready_model();

        model.begin_drag(2);
        assert_eq!(model.drag, DragState::Node { node: 2 });

        let target = vec2(120.0, -60.0);
        model.update_drag(target);
        step(&mut model, 30);
        assert_eq!(model.simulation.as_ref().unwrap().positions()[2], target);

        model.end_drag();
        assert_eq!(model.drag, DragState::Idle);
    }

    #[test]
    fn release_unpins_and_lets_the_node_move_again() {
        let mut model = ready_model();

        model.begin_drag(0);
        model.update_drag(vec2(300.0, 300.0));
        step(&mut model, 5);
        model.end_drag();

        step(&mut model, 20);
        let position = model.simulation.as_ref().unwrap().positions()[0];
        assert_ne!(position, vec2(300.0, 300.0));
    }

    #[test]
    fn cancel_always_clears_pins() {
        let mut model = ready_model();

        model.begin_drag(1);
        model.update_drag(vec2(50.0, 50.0));
        model.cancel_interaction();
        assert_eq!(model.drag, DragState::Idle);

        step(&mut model, 20);
        let position = model.simulation.as_ref().unwrap().positions()[1];
        assert_ne!(position, vec2(50.0, 50.0));
    }

    #[test]
    fn drag_reheats_the_solver() {
        let mut model = ready_model();
        {
            let simulation = model.simulation.as_mut().unwrap();
            while simulation.step() {}
            assert!(!simulation.is_running());
        }

        model.begin_drag(0);
        let simulation = model.simulation.as_ref().unwrap();
        assert!(simulation.is_running());
        assert!(simulation.alpha() >= 0.3);
    }

    #[test]
    fn hover_enter_builds_the_active_set_and_leave_keeps_it_for_fade_out() {
        let mut model = ready_model();

        model.update_hover(Some(0));
        let highlight = model.highlight.clone().unwrap();
        assert_eq!(highlight.hovered, 0);
        let expected: HashSet<usize> = std::iter::once(0)
            .chain(model.snapshot.neighbors(0))
            .collect();
        assert_eq!(highlight.active_nodes, expected);

        model.update_hover(None);
        assert!(model.hovered.is_none());
        // The stale set stays around until the dim animation finishes.
        assert!(model.highlight.is_some());
    }

    #[test]
    fn hovering_a_new_node_replaces_the_active_set() {
        let mut model = ready_model();

        model.update_hover(Some(0));
        model.update_hover(Some(3));
        let highlight = model.highlight.clone().unwrap();
        assert_eq!(highlight.hovered, 3);
        assert!(highlight.active_nodes.contains(&3));
    }
}

use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, Ui, vec2,
};

use crate::model::NodeKind;

use super::super::render_utils::{draw_background, screen_to_world, with_opacity, world_to_screen};
use super::super::scene::{self, EdgeVisual, HighlightView, NodeShape, Scene, TextVisual};
use super::super::{DragState, ViewModel};

const NODE_OUTLINE_COLOR: Color32 = Color32::from_rgb(30, 41, 59);
const SELECTION_RING_COLOR: Color32 = Color32::from_rgb(125, 211, 252);
const GRADIENT_SEGMENTS: usize = 6;

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Container => "container",
        NodeKind::Leaf => "leaf",
        NodeKind::Attribute => "attribute",
    }
}

/// One slice of an edge's source→target alpha ramp: segment endpoints plus
/// the interpolated alpha at the segment midpoint.
fn edge_segment(edge: &EdgeVisual, segment: usize) -> (Pos2, Pos2, f32) {
    let step = 1.0 / GRADIENT_SEGMENTS as f32;
    let t0 = segment as f32 * step;
    let t1 = t0 + step;
    let alpha = edge.source_alpha + (edge.target_alpha - edge.source_alpha) * (t0 + t1) * 0.5;
    (
        edge.from + (edge.to - edge.from) * t0,
        edge.from + (edge.to - edge.from) * t1,
        alpha,
    )
}

fn paint_gradient_edge(painter: &Painter, edge: &EdgeVisual) {
    for segment in 0..GRADIENT_SEGMENTS {
        let (start, end, alpha) = edge_segment(edge, segment);
        let stroke = Stroke::new(edge.width, with_opacity(edge.color, edge.opacity * alpha));
        painter.line_segment([start, end], stroke);
    }
}

/// Same alpha ramp as the solid edges; the dash offset keeps the pattern
/// continuous across segment boundaries.
fn paint_dashed_edge(painter: &Painter, edge: &EdgeVisual) {
    let segment_length = edge.from.distance(edge.to) / GRADIENT_SEGMENTS as f32;
    for segment in 0..GRADIENT_SEGMENTS {
        let (start, end, alpha) = edge_segment(edge, segment);
        let stroke = Stroke::new(edge.width, with_opacity(edge.color, edge.opacity * alpha));
        painter.extend(Shape::dashed_line_with_offset(
            &[start, end],
            stroke,
            &[5.0],
            &[5.0],
            segment_length * segment as f32,
        ));
    }
}

fn paint_label(painter: &Painter, label: &TextVisual) {
    if label.opacity <= 0.01 {
        return;
    }

    let color = if label.strong {
        Color32::WHITE
    } else {
        Color32::from_gray(215)
    };
    let font = if label.strong {
        FontId::proportional(label.font_size)
    } else {
        FontId::monospace(label.font_size)
    };
    painter.text(
        label.pos,
        Align2::CENTER_CENTER,
        &label.text,
        font,
        with_opacity(color, label.opacity),
    );
}

fn paint_scene(painter: &Painter, scene: &Scene) {
    for edge in &scene.edges {
        if edge.opacity <= 0.0 {
            continue;
        }
        if edge.dashed {
            paint_dashed_edge(painter, edge);
        } else {
            paint_gradient_edge(painter, edge);
        }
    }

    for label in &scene.edge_labels {
        paint_label(painter, label);
    }

    for visual in &scene.nodes {
        match visual.shape {
            NodeShape::Circle { center, radius } => {
                if visual.glow {
                    painter.circle_filled(
                        center,
                        radius * 1.35,
                        with_opacity(visual.fill, visual.opacity * 0.18),
                    );
                    painter.circle_filled(
                        center,
                        radius * 1.15,
                        with_opacity(visual.fill, visual.opacity * 0.35),
                    );
                }
                painter.circle_filled(center, radius, with_opacity(visual.fill, visual.opacity));
                painter.circle_stroke(
                    center,
                    radius,
                    Stroke::new(
                        visual.outline_width,
                        with_opacity(NODE_OUTLINE_COLOR, visual.opacity),
                    ),
                );
            }
            NodeShape::RoundedRect { rect, rounding } => {
                painter.rect_filled(rect, rounding, with_opacity(visual.fill, visual.opacity));
                painter.rect_stroke(
                    rect,
                    rounding,
                    Stroke::new(
                        visual.outline_width,
                        with_opacity(NODE_OUTLINE_COLOR, visual.opacity),
                    ),
                    StrokeKind::Outside,
                );
            }
        }
    }

    for label in &scene.node_labels {
        paint_label(painter, label);
    }
}

impl ViewModel {
    fn paint_selection_ring(&self, painter: &Painter, rect: Rect) {
        let Some(selected) = &self.selected else {
            return;
        };
        let Some(&index) = self.snapshot.index_by_id.get(selected) else {
            return;
        };
        let Some(simulation) = self.simulation.as_ref() else {
            return;
        };
        let Some(&world_pos) = simulation.positions().get(index) else {
            return;
        };
        let Some(node) = self.snapshot.nodes.get(index) else {
            return;
        };

        let center = world_to_screen(rect, self.pan, self.zoom, world_pos);
        let radius = (node.size + 6.0) * self.zoom;
        painter.circle_stroke(
            center,
            radius,
            Stroke::new(2.0 * self.zoom, SELECTION_RING_COLOR),
        );
    }

    fn paint_hover_status(&self, painter: &Painter, rect: Rect) {
        let Some(node) = self.hovered.and_then(|index| self.snapshot.nodes.get(index)) else {
            return;
        };

        painter.text(
            rect.left_top() + vec2(12.0, 12.0),
            Align2::LEFT_TOP,
            format!(
                "{}  |  {}  |  {}",
                node.name,
                node.category,
                kind_label(node.kind)
            ),
            FontId::proportional(13.0),
            Color32::from_gray(200),
        );
    }

    fn resolve_hover(&self, rect: Rect, pointer: Option<Pos2>) -> Option<usize> {
        match self.drag {
            DragState::Node { node } => Some(node),
            DragState::Pan => None,
            DragState::Idle => {
                let simulation = self.simulation.as_ref()?;
                scene::hit_test(
                    rect,
                    &self.snapshot,
                    simulation.positions(),
                    self.pan,
                    self.zoom,
                    pointer?,
                )
            }
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        if self.snapshot.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No entities to display",
                FontId::proportional(14.0),
                Color32::from_gray(150),
            );
            return;
        }

        self.handle_zoom(ui, rect, &response);
        self.handle_secondary_pan(&response);
        self.ensure_simulation(rect);

        if self.simulation.is_none() {
            // Viewport had no usable size yet; try again next frame.
            ui.ctx().request_repaint();
            return;
        }

        if ui.input(|input| input.key_pressed(egui::Key::Escape)) {
            self.cancel_interaction();
        }

        let moving = self
            .simulation
            .as_mut()
            .is_some_and(|simulation| simulation.step());

        let hovered = self.resolve_hover(rect, response.hover_pos());
        self.update_hover(hovered);

        if response.drag_started_by(egui::PointerButton::Primary) {
            match hovered {
                Some(node) => self.begin_drag(node),
                None => self.drag = DragState::Pan,
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            match self.drag {
                DragState::Node { .. } => {
                    if let Some(pointer) = response.interact_pointer_pos() {
                        self.update_drag(screen_to_world(rect, self.pan, self.zoom, pointer));
                    }
                }
                DragState::Pan => self.pan += response.drag_delta(),
                DragState::Idle => {}
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            match self.drag {
                DragState::Node { .. } => self.end_drag(),
                DragState::Pan | DragState::Idle => self.drag = DragState::Idle,
            }
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let selection = hovered
                .and_then(|index| self.snapshot.nodes.get(index))
                .map(|node| node.id.clone());
            self.apply_selection(selection);
        }

        if hovered.is_some() && matches!(self.drag, DragState::Idle | DragState::Node { .. }) {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let hover_active = self.hovered.is_some();
        let dim = ui
            .ctx()
            .animate_bool_with_time(egui::Id::new("graph-hover-dim"), hover_active, 0.2);
        let grow = ui
            .ctx()
            .animate_bool_with_time(egui::Id::new("graph-hover-grow"), hover_active, 0.2);
        if !hover_active && dim <= 0.0 {
            self.highlight = None;
        }

        if let Some(simulation) = self.simulation.as_ref() {
            let highlight = self
                .highlight
                .as_ref()
                .map(|state| HighlightView { state, dim, grow });
            let scene = scene::build_scene(
                rect,
                &self.snapshot,
                simulation.positions(),
                self.pan,
                self.zoom,
                highlight,
                &self.config,
            );
            paint_scene(&painter, &scene);
        }

        self.paint_selection_ring(&painter, rect);
        self.paint_hover_status(&painter, rect);

        if moving || response.dragged() {
            ui.ctx().request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn edge(dashed: bool) -> EdgeVisual {
        EdgeVisual {
            from: pos2(0.0, 0.0),
            to: pos2(120.0, 0.0),
            width: 2.0,
            color: Color32::WHITE,
            opacity: 0.6,
            source_alpha: 0.8,
            target_alpha: 0.2,
            dashed,
        }
    }

    #[test]
    fn edge_segments_tile_the_line_and_ramp_the_alpha() {
        let edge = edge(true);

        let mut previous_end = edge.from;
        let mut previous_alpha = edge.source_alpha + 1.0;
        for segment in 0..GRADIENT_SEGMENTS {
            let (start, end, alpha) = edge_segment(&edge, segment);
            assert!((start - previous_end).length() < 1e-3);
            assert!(alpha < previous_alpha, "alpha must fade toward the target");
            assert!(alpha <= edge.source_alpha && alpha >= edge.target_alpha);
            previous_end = end;
            previous_alpha = alpha;
        }
        assert!((previous_end - edge.to).length() < 1e-3);
    }

    #[test]
    fn dashed_edges_keep_the_directional_ramp() {
        // Dashed rendering slices the same ramp as solid edges, so the first
        // and last segments must not share one averaged alpha.
        let edge = edge(true);
        let (_, _, near_source) = edge_segment(&edge, 0);
        let (_, _, near_target) = edge_segment(&edge, GRADIENT_SEGMENTS - 1);
        assert!(near_source > near_target);
        assert!((near_source - 0.75).abs() < 1e-4);
        assert!((near_target - 0.25).abs() < 1e-4);
    }
}

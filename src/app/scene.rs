use std::collections::HashMap;

use eframe::egui::{Color32, Pos2, Rect, Vec2, vec2};

use crate::model::{ConnectionKind, GraphSnapshot, NodeKind};

use super::highlight::HighlightState;
use super::render_utils::{
    DEFAULT_CONNECTION_COLOR, circle_visible, edge_visible, fallback_category_color,
    world_to_screen,
};

const LABEL_TRUNCATE_AT: usize = 12;
const CONTAINER_LABEL_SIZE: f32 = 12.0;
const ATTRIBUTE_LABEL_SIZE: f32 = 9.0;
const EDGE_LABEL_SIZE: f32 = 9.0;
const HOVER_GROW_RADIUS: f32 = 5.0;

/// Cosmetic configuration passed in by the host. None of it affects the
/// simulation; changing it never rebuilds the solver.
#[derive(Clone, Debug, Default)]
pub(in crate::app) struct VisualConfig {
    pub(in crate::app) show_connection_labels: bool,
    /// Lowercased category name to fill color.
    pub(in crate::app) category_colors: HashMap<String, Color32>,
    pub(in crate::app) connection_colors: HashMap<ConnectionKind, Color32>,
}

/// Hover highlight as the renderer sees it: the active sets plus the eased
/// animation factors (0..1) for dimming and hovered-node growth.
#[derive(Clone, Copy)]
pub(in crate::app) struct HighlightView<'a> {
    pub(in crate::app) state: &'a HighlightState,
    pub(in crate::app) dim: f32,
    pub(in crate::app) grow: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum NodeShape {
    Circle { center: Pos2, radius: f32 },
    RoundedRect { rect: Rect, rounding: f32 },
}

#[derive(Clone, Debug)]
pub(in crate::app) struct NodeVisual {
    pub(in crate::app) node: usize,
    pub(in crate::app) shape: NodeShape,
    pub(in crate::app) fill: Color32,
    pub(in crate::app) outline_width: f32,
    pub(in crate::app) opacity: f32,
    pub(in crate::app) glow: bool,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct EdgeVisual {
    pub(in crate::app) from: Pos2,
    pub(in crate::app) to: Pos2,
    pub(in crate::app) width: f32,
    pub(in crate::app) color: Color32,
    pub(in crate::app) opacity: f32,
    /// Directional gradient endpoints: opaque near the source, fading
    /// toward the target.
    pub(in crate::app) source_alpha: f32,
    pub(in crate::app) target_alpha: f32,
    pub(in crate::app) dashed: bool,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct TextVisual {
    pub(in crate::app) pos: Pos2,
    pub(in crate::app) text: String,
    pub(in crate::app) font_size: f32,
    pub(in crate::app) strong: bool,
    pub(in crate::app) opacity: f32,
}

/// Drawable primitives for one frame, in paint order: edges under edge
/// labels under nodes under node labels.
#[derive(Clone, Debug, Default)]
pub(in crate::app) struct Scene {
    pub(in crate::app) edges: Vec<EdgeVisual>,
    pub(in crate::app) edge_labels: Vec<TextVisual>,
    pub(in crate::app) nodes: Vec<NodeVisual>,
    pub(in crate::app) node_labels: Vec<TextVisual>,
}

/// Topmost node under the pointer, later-drawn nodes checked first. Pure in
/// the same inputs as [`build_scene`], so hover can be resolved before the
/// scene (whose opacities depend on it) is assembled.
pub(in crate::app) fn hit_test(
    rect: Rect,
    snapshot: &GraphSnapshot,
    positions: &[Vec2],
    pan: Vec2,
    zoom: f32,
    pointer: Pos2,
) -> Option<usize> {
    snapshot
        .nodes
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, node)| {
            let center = world_to_screen(rect, pan, zoom, *positions.get(index)?);
            let inside = match node.kind {
                NodeKind::Container | NodeKind::Leaf => {
                    center.distance(pointer) <= node.size * zoom
                }
                NodeKind::Attribute => {
                    let half = vec2(node.size, node.size * 0.5) * zoom;
                    Rect::from_center_size(center, half * 2.0).contains(pointer)
                }
            };
            inside.then_some(index)
        })
}

/// Display label for a node. Attribute names longer than twelve characters
/// are cut at twelve plus an ellipsis.
pub(in crate::app) fn display_name(kind: NodeKind, name: &str) -> String {
    if kind == NodeKind::Attribute && name.chars().count() > LABEL_TRUNCATE_AT {
        let mut truncated: String = name.chars().take(LABEL_TRUNCATE_AT).collect();
        truncated.push('…');
        truncated
    } else {
        name.to_owned()
    }
}

pub(in crate::app) fn stroke_width(kind: ConnectionKind, strength: f32) -> f32 {
    match kind {
        ConnectionKind::Containment => 2.0,
        ConnectionKind::Relation => (strength * 5.0).max(2.0),
        ConnectionKind::Reference => (strength * 4.0).max(1.0),
    }
}

fn connection_opacity(kind: ConnectionKind) -> f32 {
    if kind == ConnectionKind::Containment {
        0.8
    } else {
        0.6
    }
}

fn node_base_opacity(kind: NodeKind) -> f32 {
    if kind == NodeKind::Attribute { 0.8 } else { 0.9 }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

pub(in crate::app) fn category_color(config: &VisualConfig, category: &str) -> Color32 {
    config
        .category_colors
        .get(category)
        .copied()
        .unwrap_or_else(|| fallback_category_color(category))
}

fn connection_color(config: &VisualConfig, kind: ConnectionKind) -> Color32 {
    config
        .connection_colors
        .get(&kind)
        .copied()
        .unwrap_or(DEFAULT_CONNECTION_COLOR)
}

/// Pure per-frame mapping from simulation and interaction state to drawable
/// primitives. Reads positions, never writes them.
pub(in crate::app) fn build_scene(
    rect: Rect,
    snapshot: &GraphSnapshot,
    positions: &[Vec2],
    pan: Vec2,
    zoom: f32,
    highlight: Option<HighlightView<'_>>,
    config: &VisualConfig,
) -> Scene {
    let mut scene = Scene::default();

    for (index, (connection, &(source, target))) in snapshot
        .connections
        .iter()
        .zip(&snapshot.endpoints)
        .enumerate()
    {
        let (Some(&source_pos), Some(&target_pos)) = (positions.get(source), positions.get(target))
        else {
            continue;
        };

        let from = world_to_screen(rect, pan, zoom, source_pos);
        let to = world_to_screen(rect, pan, zoom, target_pos);
        if !edge_visible(rect, from, to, 4.0) {
            continue;
        }

        let base = connection_opacity(connection.kind);
        let (opacity, label_opacity) = match &highlight {
            Some(view) => {
                let incident = view.state.active_connections.contains(&index);
                let edge_target = if incident { base } else { 0.05 };
                let base_label = if config.show_connection_labels { 0.7 } else { 0.0 };
                let label_target = if incident { base_label } else { 0.0 };
                (
                    lerp(base, edge_target, view.dim),
                    lerp(base_label, label_target, view.dim),
                )
            }
            None => (
                base,
                if config.show_connection_labels { 0.7 } else { 0.0 },
            ),
        };

        scene.edges.push(EdgeVisual {
            from,
            to,
            width: stroke_width(connection.kind, connection.strength) * zoom,
            color: connection_color(config, connection.kind),
            opacity,
            source_alpha: 0.8,
            target_alpha: 0.2,
            dashed: connection.kind == ConnectionKind::Reference,
        });

        if let Some(label) = &connection.label {
            let midpoint = from + (to - from) * 0.5;
            scene.edge_labels.push(TextVisual {
                pos: midpoint + vec2(0.0, -5.0 * zoom),
                text: label.clone(),
                font_size: EDGE_LABEL_SIZE * zoom,
                strong: false,
                opacity: label_opacity,
            });
        }
    }

    for (index, node) in snapshot.nodes.iter().enumerate() {
        let Some(&world_pos) = positions.get(index) else {
            continue;
        };

        let center = world_to_screen(rect, pan, zoom, world_pos);
        let grow = match &highlight {
            Some(view) if view.state.hovered == index => view.grow,
            _ => 0.0,
        };

        let base = node_base_opacity(node.kind);
        let opacity = match &highlight {
            Some(view) => {
                let target = if view.state.active_nodes.contains(&index) {
                    1.0
                } else {
                    0.1
                };
                lerp(base, target, view.dim)
            }
            None => base,
        };

        let fill = category_color(config, &node.category);
        let (shape, cull_radius, outline_width, label_offset, label_size, strong) = match node.kind
        {
            NodeKind::Container | NodeKind::Leaf => {
                let radius = (node.size + HOVER_GROW_RADIUS * grow) * zoom;
                (
                    NodeShape::Circle { center, radius },
                    radius,
                    3.0 * zoom,
                    5.0 * zoom,
                    CONTAINER_LABEL_SIZE,
                    true,
                )
            }
            NodeKind::Attribute => {
                let half = vec2(node.size + 2.0 * grow, (node.size + 2.0 * grow) * 0.5) * zoom;
                (
                    NodeShape::RoundedRect {
                        rect: Rect::from_center_size(center, half * 2.0),
                        rounding: 4.0 * zoom,
                    },
                    half.x,
                    1.0 * zoom,
                    3.0 * zoom,
                    ATTRIBUTE_LABEL_SIZE,
                    false,
                )
            }
        };

        if !circle_visible(rect, center, cull_radius + 8.0) {
            continue;
        }

        scene.nodes.push(NodeVisual {
            node: index,
            shape,
            fill,
            outline_width,
            opacity,
            glow: node.kind != NodeKind::Attribute,
        });

        scene.node_labels.push(TextVisual {
            pos: center + vec2(0.0, label_offset),
            text: display_name(node.kind, &node.name),
            font_size: label_size * zoom,
            strong,
            opacity,
        });
    }

    scene
}

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;
use super::DISTANCE_MIN_SQ;

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
}

/// Deterministic unit vector for coincident points, keyed on the pair so the
/// same collision always resolves in the same direction.
pub(super) fn separation_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// Repulsion exerted on a node at `point` by a charge at `source`. The charge
/// is negative by convention; the result points away from the source.
pub(super) fn repulsion_between(point: Vec2, source: Vec2, charge: f32) -> Vec2 {
    let delta = point - source;
    let distance_sq = delta.length_sq().max(DISTANCE_MIN_SQ);
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (-charge / distance_sq)
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    charges: &[f32],
    theta: f32,
    force: &mut Vec2,
) {
    if node.count == 0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += repulsion_between(point, positions[other_index], charges[other_index]);
        }
        return;
    }

    let delta = point - node.charge_center;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let can_approximate = !node.bounds.contains(point)
        && ((node.bounds.side_length() / distance) < theta)
        && node.count > 1;

    if can_approximate {
        let direction = delta / distance;
        let scaled = -node.charge / distance_sq.max(DISTANCE_MIN_SQ);
        *force += direction * scaled;
        return;
    }

    for child in &node.children {
        if let Some(child) = child.as_ref() {
            accumulate_repulsion_for_node(child, index, positions, charges, theta, force);
        }
    }
}

pub(super) fn collide_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    padded_radii: &[f32],
    strength: f32,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        separation_direction(from, to)
    };

    let min_distance = padded_radii[from] + padded_radii[to];
    if distance < min_distance {
        let overlap_push = (min_distance - distance) * strength;
        forces[from] += direction * overlap_push;
        forces[to] -= direction * overlap_push;
    }
}

/// Dual-tree traversal pruning node pairs that cannot overlap. Exact for all
/// pairs within `max_distance_sq`, so it matches the exhaustive pass.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    padded_radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for i in 0..node_a.indices.len() {
                let from = node_a.indices[i];
                for j in (i + 1)..node_a.indices.len() {
                    let to = node_a.indices[j];
                    collide_pair(from, to, positions, padded_radii, params.strength, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collide_pair(from, to, positions, padded_radii, params.strength, forces);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_ref() else {
                continue;
            };

            accumulate_collision_pairs(
                child_a,
                child_a,
                true,
                positions,
                padded_radii,
                params,
                forces,
            );

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_ref() else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a,
                    child_b,
                    false,
                    positions,
                    padded_radii,
                    params,
                    forces,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in &node_a.children {
            let Some(child) = child.as_ref() else {
                continue;
            };
            accumulate_collision_pairs(
                child,
                node_b,
                false,
                positions,
                padded_radii,
                params,
                forces,
            );
        }
    } else {
        for child in &node_b.children {
            let Some(child) = child.as_ref() else {
                continue;
            };
            accumulate_collision_pairs(
                node_a,
                child,
                false,
                positions,
                padded_radii,
                params,
                forces,
            );
        }
    }
}

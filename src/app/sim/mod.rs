mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use crate::model::{ConnectionKind, GraphSnapshot, NodeKind};
use crate::util::stable_pair;

use forces::{
    CollisionParams, accumulate_collision_pairs, accumulate_repulsion_for_node, collide_pair,
    repulsion_between, separation_direction,
};
use quadtree::QuadNode;

/// Cooling floor: once alpha drops below this (with no reheat target), the
/// solver stops scheduling ticks and the last frame stays on screen.
pub(in crate::app) const ALPHA_MIN: f32 = 0.001;
const ALPHA_REHEAT: f32 = 0.3;
const ALPHA_DECAY_TICKS: f32 = 300.0;
const VELOCITY_RETAIN: f32 = 0.6;
const BARNES_HUT_THETA: f32 = 0.72;
const EXHAUSTIVE_NODE_LIMIT: usize = 24;
const DISTANCE_MIN_SQ: f32 = 1.0;
const CENTER_STRENGTH: f32 = 0.02;
const COLLISION_STRENGTH: f32 = 0.5;

pub(in crate::app) fn link_distance(kind: ConnectionKind) -> f32 {
    match kind {
        ConnectionKind::Containment => 60.0,
        ConnectionKind::Relation => 150.0,
        ConnectionKind::Reference => 100.0,
    }
}

fn charge_for(kind: NodeKind) -> f32 {
    match kind {
        NodeKind::Container => -400.0,
        NodeKind::Attribute => -150.0,
        NodeKind::Leaf => -300.0,
    }
}

pub(in crate::app) fn collision_padding(kind: NodeKind) -> f32 {
    match kind {
        NodeKind::Container => 10.0,
        NodeKind::Attribute | NodeKind::Leaf => 5.0,
    }
}

/// How pairwise repulsion is computed. `Auto` picks exhaustive pairs for
/// small graphs and the Barnes–Hut quadtree beyond [`EXHAUSTIVE_NODE_LIMIT`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) enum ChargeMode {
    #[default]
    Auto,
    Exhaustive,
    BarnesHut,
}

struct Link {
    source: usize,
    target: usize,
    rest: f32,
    strength: f32,
    bias: f32,
}

/// Iterative force solver over one snapshot of the entity graph. Owns the
/// position/velocity arrays; the interaction layer owns only the pins. A
/// change to the node/connection set replaces the whole instance, it is
/// never re-parameterized in place.
pub(in crate::app) struct Simulation {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pins: Vec<Option<Vec2>>,
    charges: Vec<f32>,
    padded_radii: Vec<f32>,
    links: Vec<Link>,
    forces: Vec<Vec2>,
    alpha: f32,
    alpha_decay: f32,
    alpha_target: f32,
    running: bool,
    charge_mode: ChargeMode,
}

impl Simulation {
    /// Returns `None` for an empty node set: no solver is constructed and
    /// the caller clears the scene.
    pub(in crate::app) fn new(
        snapshot: &GraphSnapshot,
        viewport: Vec2,
        charge_mode: ChargeMode,
    ) -> Option<Self> {
        let node_count = snapshot.nodes.len();
        if node_count == 0 {
            return None;
        }

        let mut spread = (node_count as f32).sqrt() * 48.0;
        let viewport_min = viewport.x.min(viewport.y);
        if viewport_min > 1.0 {
            spread = spread.min(viewport_min * 0.45);
        }
        spread = spread.max(60.0);

        let positions = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let (jx, jy) = stable_pair(&node.id);
                let mut seed = vec2(jx, jy);
                if seed.length_sq() <= 0.0001 {
                    seed = separation_direction(index, index + 1);
                }
                seed * spread
            })
            .collect::<Vec<_>>();

        let charges = snapshot
            .nodes
            .iter()
            .map(|node| charge_for(node.kind))
            .collect::<Vec<_>>();
        let padded_radii = snapshot
            .nodes
            .iter()
            .map(|node| node.size + collision_padding(node.kind))
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; node_count];
        for &(source, target) in &snapshot.endpoints {
            if source != target {
                degree[source] += 1;
                degree[target] += 1;
            }
        }

        let links = snapshot
            .connections
            .iter()
            .zip(&snapshot.endpoints)
            .filter(|&(_, &(source, target))| source != target)
            .map(|(connection, &(source, target))| {
                let degree_sum = (degree[source] + degree[target]).max(1) as f32;
                Link {
                    source,
                    target,
                    rest: link_distance(connection.kind),
                    strength: 1.0 / degree[source].min(degree[target]).max(1) as f32,
                    bias: degree[source] as f32 / degree_sum,
                }
            })
            .collect();

        Some(Self {
            velocities: vec![Vec2::ZERO; node_count],
            pins: vec![None; node_count],
            forces: vec![Vec2::ZERO; node_count],
            positions,
            charges,
            padded_radii,
            links,
            alpha: 1.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / ALPHA_DECAY_TICKS),
            alpha_target: 0.0,
            running: true,
            charge_mode,
        })
    }

    pub(in crate::app) fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn is_running(&self) -> bool {
        self.running
    }

    /// Pin a node while it is dragged: its position tracks the pin exactly
    /// and its velocity is discarded, but it still exerts forces on others.
    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(pin) = self.pins.get_mut(index) {
            *pin = Some(position);
        }
    }

    pub(in crate::app) fn clear_pin(&mut self, index: usize) {
        if let Some(pin) = self.pins.get_mut(index) {
            *pin = None;
        }
    }

    pub(in crate::app) fn clear_all_pins(&mut self) {
        self.pins.fill(None);
    }

    /// Drag start: raise the cooling floor so the layout responds while the
    /// pointer is down.
    pub(in crate::app) fn reheat(&mut self) {
        self.alpha_target = ALPHA_REHEAT;
        self.alpha = self.alpha.max(ALPHA_REHEAT);
        self.running = true;
    }

    /// Drag end: let alpha relax back toward zero.
    pub(in crate::app) fn relax(&mut self) {
        self.alpha_target = 0.0;
    }

    /// Advance one tick. Returns `false` once settled; the caller stops
    /// scheduling further ticks but keeps rendering the final positions.
    pub(in crate::app) fn step(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        if self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN {
            self.running = false;
            return false;
        }

        let node_count = self.positions.len();
        self.forces.fill(Vec2::ZERO);

        let use_tree = match self.charge_mode {
            ChargeMode::Exhaustive => false,
            ChargeMode::BarnesHut => true,
            ChargeMode::Auto => node_count > EXHAUSTIVE_NODE_LIMIT,
        };

        let tree = if use_tree {
            QuadNode::build(&self.positions, &self.charges)
        } else {
            None
        };

        if let Some(tree) = &tree {
            for (index, force) in self.forces.iter_mut().enumerate() {
                let mut repulsion = Vec2::ZERO;
                accumulate_repulsion_for_node(
                    tree,
                    index,
                    &self.positions,
                    &self.charges,
                    BARNES_HUT_THETA,
                    &mut repulsion,
                );
                *force += repulsion * self.alpha;
            }

            let max_collision_distance = self
                .padded_radii
                .iter()
                .fold(0.0_f32, |a, &b| a.max(b))
                * 2.0;
            accumulate_collision_pairs(
                tree,
                tree,
                true,
                &self.positions,
                &self.padded_radii,
                CollisionParams {
                    strength: COLLISION_STRENGTH,
                    max_distance_sq: max_collision_distance * max_collision_distance,
                },
                &mut self.forces,
            );
        } else {
            for from in 0..node_count {
                for to in (from + 1)..node_count {
                    let repulsion_on_from = repulsion_between(
                        self.positions[from],
                        self.positions[to],
                        self.charges[to],
                    );
                    let repulsion_on_to = repulsion_between(
                        self.positions[to],
                        self.positions[from],
                        self.charges[from],
                    );
                    self.forces[from] += repulsion_on_from * self.alpha;
                    self.forces[to] += repulsion_on_to * self.alpha;

                    collide_pair(
                        from,
                        to,
                        &self.positions,
                        &self.padded_radii,
                        COLLISION_STRENGTH,
                        &mut self.forces,
                    );
                }
            }
        }

        for (force, position) in self.forces.iter_mut().zip(&self.positions) {
            *force -= *position * (CENTER_STRENGTH * self.alpha);
        }

        // Link springs act on velocities directly, split by degree bias so a
        // hub is corrected less than its leaves.
        for link in &self.links {
            let mut delta = (self.positions[link.target] + self.velocities[link.target])
                - (self.positions[link.source] + self.velocities[link.source]);
            if delta.length_sq() < 1e-8 {
                delta = separation_direction(link.source, link.target);
            }

            let distance = delta.length();
            let correction = (distance - link.rest) / distance * self.alpha * link.strength;
            let push = delta * correction;

            self.velocities[link.target] -= push * link.bias;
            self.velocities[link.source] += push * (1.0 - link.bias);
        }

        for index in 0..node_count {
            if let Some(pin) = self.pins[index] {
                self.positions[index] = pin;
                self.velocities[index] = Vec2::ZERO;
                continue;
            }

            let velocity = (self.velocities[index] + self.forces[index]) * VELOCITY_RETAIN;
            self.velocities[index] = velocity;
            self.positions[index] += velocity;
        }

        true
    }
}

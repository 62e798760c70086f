use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Fallback visual radius for nodes whose declared size is missing, zero,
/// negative, or non-finite. Keeps NaN out of the collision/repulsion math.
pub const MIN_NODE_SIZE: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Container,
    Leaf,
    Attribute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Containment,
    Relation,
    Reference,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub size: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub strength: f32,
    #[serde(default)]
    pub label: Option<String>,
}

/// On-disk snapshot of a workspace export: the entity arrays plus the
/// cosmetic configuration the host would otherwise pass in.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub category_colors: HashMap<String, String>,
    #[serde(default)]
    pub connection_colors: HashMap<String, String>,
    #[serde(default)]
    pub show_connection_labels: bool,
}

/// Validated entity set ready for simulation: node ids are unique, sizes are
/// finite and positive, and every connection resolves to two present nodes.
#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub index_by_id: HashMap<String, usize>,
    /// Resolved `(source, target)` node indices, parallel to `connections`.
    pub endpoints: Vec<(usize, usize)>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        let mut kept_nodes: Vec<Node> = Vec::with_capacity(nodes.len());
        let mut index_by_id = HashMap::with_capacity(nodes.len());

        for mut node in nodes {
            if index_by_id.contains_key(&node.id) {
                log::warn!("duplicate node id {:?} dropped", node.id);
                continue;
            }

            if !node.size.is_finite() || node.size <= 0.0 {
                node.size = MIN_NODE_SIZE;
            }
            node.category.make_ascii_lowercase();

            index_by_id.insert(node.id.clone(), kept_nodes.len());
            kept_nodes.push(node);
        }

        let mut kept_connections = Vec::with_capacity(connections.len());
        let mut endpoints = Vec::with_capacity(connections.len());
        let mut dropped = 0usize;
        for mut connection in connections {
            let source = index_by_id.get(&connection.source).copied();
            let target = index_by_id.get(&connection.target).copied();
            let (Some(source), Some(target)) = (source, target) else {
                dropped += 1;
                continue;
            };

            if !connection.strength.is_finite() {
                connection.strength = 0.0;
            }
            connection.strength = connection.strength.clamp(0.0, 1.0);

            endpoints.push((source, target));
            kept_connections.push(connection);
        }

        if dropped > 0 {
            log::info!("dropped {dropped} connection(s) with unresolved endpoints");
        }

        Self {
            nodes: kept_nodes,
            connections: kept_connections,
            index_by_id,
            endpoints,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct neighbors of a node, in connection order, deduplicated.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let mut neighbors = Vec::new();
        for &(source, target) in &self.endpoints {
            let other = if source == index {
                target
            } else if target == index {
                source
            } else {
                continue;
            };

            if other != index && !neighbors.contains(&other) {
                neighbors.push(other);
            }
        }
        neighbors
    }
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<SnapshotFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: SnapshotFile = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;

    log::info!(
        "loaded snapshot {}: {} node(s), {} connection(s)",
        path.display(),
        snapshot.nodes.len(),
        snapshot.connections.len()
    );
    Ok(snapshot)
}

fn node(id: &str, name: &str, category: &str, kind: NodeKind, size: f32) -> Node {
    Node {
        id: id.to_owned(),
        name: name.to_owned(),
        category: category.to_owned(),
        kind,
        size,
    }
}

fn connection(
    source: &str,
    target: &str,
    kind: ConnectionKind,
    strength: f32,
    label: Option<&str>,
) -> Connection {
    Connection {
        source: source.to_owned(),
        target: target.to_owned(),
        kind,
        strength,
        label: label.map(str::to_owned),
    }
}

/// Built-in demo workspace, used when no snapshot file is given.
pub fn sample_workspace() -> SnapshotFile {
    use ConnectionKind::{Containment, Reference, Relation};
    use NodeKind::{Attribute, Container, Leaf};

    SnapshotFile {
        nodes: vec![
            node("projects", "Projects", "projects", Container, 24.0),
            node("wiki", "Team Wiki", "documentation", Container, 20.0),
            node("people", "People", "people", Container, 18.0),
            node("proj-atlas", "Atlas Redesign", "projects", Leaf, 14.0),
            node("proj-ingest", "Ingest Pipeline", "projects", Leaf, 14.0),
            node("wiki-onboarding", "Onboarding Guide", "documentation", Leaf, 12.0),
            node("wiki-style", "Style Guide", "documentation", Leaf, 12.0),
            node("person-maya", "Maya", "people", Leaf, 10.0),
            node("person-jonas", "Jonas", "people", Leaf, 10.0),
            node("attr-status", "Status", "projects", Attribute, 8.0),
            node("attr-due", "Due Date", "projects", Attribute, 8.0),
            node("attr-owner", "Owner", "projects", Attribute, 8.0),
            node("attr-audience", "Intended Audience Notes", "documentation", Attribute, 8.0),
        ],
        connections: vec![
            connection("projects", "proj-atlas", Containment, 1.0, None),
            connection("projects", "proj-ingest", Containment, 1.0, None),
            connection("wiki", "wiki-onboarding", Containment, 1.0, None),
            connection("wiki", "wiki-style", Containment, 1.0, None),
            connection("people", "person-maya", Containment, 1.0, None),
            connection("people", "person-jonas", Containment, 1.0, None),
            connection("proj-atlas", "attr-status", Containment, 0.8, None),
            connection("proj-atlas", "attr-due", Containment, 0.8, None),
            connection("proj-atlas", "attr-owner", Containment, 0.8, None),
            connection("wiki-onboarding", "attr-audience", Containment, 0.8, None),
            connection("proj-atlas", "person-maya", Relation, 0.9, Some("led by")),
            connection("proj-ingest", "person-jonas", Relation, 0.7, Some("led by")),
            connection("proj-atlas", "wiki-style", Reference, 0.5, Some("follows")),
            connection("wiki-onboarding", "proj-ingest", Reference, 0.4, Some("mentions")),
            connection("proj-atlas", "proj-ingest", Relation, 0.6, Some("depends on")),
        ],
        category_colors: HashMap::new(),
        connection_colors: HashMap::new(),
        show_connection_labels: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes_ab() -> Vec<Node> {
        vec![
            node("a", "A", "alpha", NodeKind::Container, 20.0),
            node("b", "B", "beta", NodeKind::Leaf, 15.0),
        ]
    }

    #[test]
    fn dangling_connections_are_dropped() {
        let connections = vec![
            connection("a", "b", ConnectionKind::Relation, 0.5, None),
            connection("a", "missing", ConnectionKind::Reference, 0.5, None),
            connection("ghost", "b", ConnectionKind::Containment, 1.0, None),
        ];

        let snapshot = GraphSnapshot::new(nodes_ab(), connections);
        assert_eq!(snapshot.connections.len(), 1);
        assert_eq!(snapshot.endpoints, vec![(0, 1)]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let connections = vec![
            connection("a", "b", ConnectionKind::Relation, 0.5, None),
            connection("a", "missing", ConnectionKind::Reference, 0.5, None),
        ];

        let once = GraphSnapshot::new(nodes_ab(), connections);
        let twice = GraphSnapshot::new(once.nodes.clone(), once.connections.clone());

        assert_eq!(once.connections.len(), twice.connections.len());
        assert_eq!(once.endpoints, twice.endpoints);
        for (kept_once, kept_twice) in once.connections.iter().zip(&twice.connections) {
            assert_eq!(kept_once.source, kept_twice.source);
            assert_eq!(kept_once.target, kept_twice.target);
        }
    }

    #[test]
    fn invalid_sizes_clamp_to_minimum() {
        let nodes = vec![
            node("nan", "NaN", "x", NodeKind::Leaf, f32::NAN),
            node("neg", "Negative", "x", NodeKind::Leaf, -3.0),
            node("inf", "Infinite", "x", NodeKind::Container, f32::INFINITY),
        ];

        let snapshot = GraphSnapshot::new(nodes, Vec::new());
        for kept in &snapshot.nodes {
            assert_eq!(kept.size, MIN_NODE_SIZE);
        }
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let nodes = vec![
            node("a", "First", "x", NodeKind::Leaf, 10.0),
            node("a", "Second", "x", NodeKind::Leaf, 12.0),
        ];

        let snapshot = GraphSnapshot::new(nodes, Vec::new());
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].name, "First");
    }

    #[test]
    fn categories_compare_case_insensitively() {
        let nodes = vec![node("a", "A", "Projects", NodeKind::Leaf, 10.0)];
        let snapshot = GraphSnapshot::new(nodes, Vec::new());
        assert_eq!(snapshot.nodes[0].category, "projects");
    }

    #[test]
    fn neighbors_cover_both_directions() {
        let nodes = vec![
            node("a", "A", "x", NodeKind::Container, 20.0),
            node("b", "B", "x", NodeKind::Leaf, 15.0),
            node("c", "C", "x", NodeKind::Leaf, 15.0),
        ];
        let connections = vec![
            connection("a", "b", ConnectionKind::Containment, 1.0, None),
            connection("c", "a", ConnectionKind::Reference, 0.3, None),
        ];

        let snapshot = GraphSnapshot::new(nodes, connections);
        let mut neighbors = snapshot.neighbors(0);
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![1, 2]);
    }

    #[test]
    fn sample_workspace_is_fully_resolved() {
        let sample = sample_workspace();
        let total = sample.connections.len();
        let snapshot = GraphSnapshot::new(sample.nodes, sample.connections);
        assert_eq!(snapshot.connections.len(), total);
    }

    #[test]
    fn snapshot_json_round_trips_through_serde() {
        let raw = r##"{
            "nodes": [
                {"id": "a", "name": "A", "category": "Projects", "type": "container", "size": 20},
                {"id": "b", "name": "B", "category": "projects", "type": "attribute", "size": 8}
            ],
            "connections": [
                {"source": "a", "target": "b", "type": "containment", "strength": 0.8}
            ],
            "showConnectionLabels": true,
            "categoryColors": {"projects": "#60a5fa"}
        }"##;

        let file: SnapshotFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.nodes.len(), 2);
        assert_eq!(file.nodes[0].kind, NodeKind::Container);
        assert_eq!(file.connections[0].kind, ConnectionKind::Containment);
        assert!(file.show_connection_labels);
        assert_eq!(file.category_colors["projects"], "#60a5fa");
    }
}

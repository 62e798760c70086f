use std::collections::HashSet;

/// Transient hover highlight: the hovered node, its direct neighbors, and the
/// connections incident to it. Recomputed on every hover event, cleared on
/// hover-exit; never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) struct HighlightState {
    pub(in crate::app) hovered: usize,
    pub(in crate::app) active_nodes: HashSet<usize>,
    pub(in crate::app) active_connections: HashSet<usize>,
}

/// Pure function of (hovered node, connection endpoints). The active node set
/// is exactly `{hovered} ∪ {u : a connection links u and hovered}`.
pub(in crate::app) fn active_set(hovered: usize, endpoints: &[(usize, usize)]) -> HighlightState {
    let mut active_nodes = HashSet::new();
    let mut active_connections = HashSet::new();
    active_nodes.insert(hovered);

    for (connection_index, &(source, target)) in endpoints.iter().enumerate() {
        if source == hovered {
            active_nodes.insert(target);
            active_connections.insert(connection_index);
        } else if target == hovered {
            active_nodes.insert(source);
            active_connections.insert(connection_index);
        }
    }

    HighlightState {
        hovered,
        active_nodes,
        active_connections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      0 -- 1    2 -- 3    4 (isolated)
    //      0 -- 2
    fn endpoints() -> Vec<(usize, usize)> {
        vec![(0, 1), (2, 3), (0, 2)]
    }

    #[test]
    fn active_set_is_exactly_hovered_plus_neighbors() {
        let state = active_set(0, &endpoints());
        assert_eq!(state.active_nodes, HashSet::from([0, 1, 2]));
        assert_eq!(state.active_connections, HashSet::from([0, 2]));
    }

    #[test]
    fn incoming_and_outgoing_connections_both_count() {
        let state = active_set(2, &endpoints());
        assert_eq!(state.active_nodes, HashSet::from([0, 2, 3]));
        assert_eq!(state.active_connections, HashSet::from([1, 2]));
    }

    #[test]
    fn isolated_node_highlights_only_itself() {
        let state = active_set(4, &endpoints());
        assert_eq!(state.active_nodes, HashSet::from([4]));
        assert!(state.active_connections.is_empty());
    }

    #[test]
    fn recomputation_is_idempotent() {
        assert_eq!(active_set(0, &endpoints()), active_set(0, &endpoints()));
    }

    #[test]
    fn self_loop_produces_no_false_neighbor() {
        let endpoints = vec![(1, 1), (1, 2)];
        let state = active_set(1, &endpoints);
        assert_eq!(state.active_nodes, HashSet::from([1, 2]));
        assert_eq!(state.active_connections, HashSet::from([0, 1]));
    }
}

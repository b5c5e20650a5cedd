use std::collections::HashSet;

use super::{EdgeId, NodeId};

/// Endpoint combination of a selected edge, used for directional highlight
/// colors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeSelectionKind {
    Both,
    SourceOnly,
    TargetOnly,
    Neither,
}

/// Selected node/edge ids plus the derived neighbours-of-selection set.
///
/// Mutated only by selection operations on the frame thread; updaters clone
/// a snapshot at tick start, so a mid-tick mutation takes effect on the next
/// update tick.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    nodes: HashSet<NodeId>,
    edges: HashSet<EdgeId>,
    neighbours: HashSet<NodeId>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole selection atomically.
    pub fn set_selection(&mut self, nodes: HashSet<NodeId>, edges: HashSet<EdgeId>) {
        self.nodes = nodes;
        self.edges = edges;
    }

    pub fn set_neighbours(&mut self, neighbours: HashSet<NodeId>) {
        self.neighbours = neighbours;
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.neighbours.clear();
    }

    pub fn selected_node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn selected_edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn some_selection(&self) -> bool {
        !self.nodes.is_empty() || !self.edges.is_empty()
    }

    pub fn is_node_selected(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn is_edge_selected(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    pub fn is_neighbour(&self, node: NodeId) -> bool {
        self.neighbours.contains(&node)
    }

    pub fn selected_nodes(&self) -> &HashSet<NodeId> {
        &self.nodes
    }

    pub fn selected_edges(&self) -> &HashSet<EdgeId> {
        &self.edges
    }

    pub fn edge_endpoint_selection(&self, source: NodeId, target: NodeId) -> EdgeSelectionKind {
        match (self.is_node_selected(source), self.is_node_selected(target)) {
            (true, true) => EdgeSelectionKind::Both,
            (true, false) => EdgeSelectionKind::SourceOnly,
            (false, true) => EdgeSelectionKind::TargetOnly,
            (false, false) => EdgeSelectionKind::Neither,
        }
    }
}

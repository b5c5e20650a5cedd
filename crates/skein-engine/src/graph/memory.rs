use std::sync::RwLock;

use glam::Vec2;

use crate::coords::{Color, Rect2D};

use super::{EdgeId, EdgeInfo, GraphIndex, NodeId, NodeInfo};

#[derive(Debug, Clone)]
struct NodeData {
    position: Vec2,
    size: f32,
    color: Color,
}

#[derive(Debug, Clone)]
struct EdgeData {
    source: NodeId,
    target: NodeId,
    weight: f32,
    directed: bool,
    color: Option<Color>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
}

/// Simple in-memory [`GraphIndex`] without spatial acceleration.
///
/// Scans every entity per query, which is fine for tests and small demos;
/// production embedders bring their own index.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    inner: RwLock<Inner>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, position: Vec2, size: f32, color: Color) -> NodeId {
        let mut inner = self.inner.write().unwrap();
        inner.nodes.push(NodeData {
            position,
            size,
            color,
        });
        NodeId(inner.nodes.len() as u32 - 1)
    }

    pub fn add_edge(
        &self,
        source: NodeId,
        target: NodeId,
        weight: f32,
        directed: bool,
        color: Option<Color>,
    ) -> EdgeId {
        let mut inner = self.inner.write().unwrap();
        inner.edges.push(EdgeData {
            source,
            target,
            weight,
            directed,
            color,
        });
        EdgeId(inner.edges.len() as u32 - 1)
    }

    pub fn set_node_position(&self, node: NodeId, position: Vec2) {
        let mut inner = self.inner.write().unwrap();
        if let Some(data) = inner.nodes.get_mut(node.0 as usize) {
            data.position = position;
        }
    }

    fn node_rect(node: &NodeData) -> Rect2D {
        Rect2D::new(
            node.position.x - node.size,
            node.position.y - node.size,
            node.position.x + node.size,
            node.position.y + node.size,
        )
    }

    fn edge_rect(inner: &Inner, edge: &EdgeData) -> Rect2D {
        let source = inner.nodes[edge.source.0 as usize].position;
        let target = inner.nodes[edge.target.0 as usize].position;
        Rect2D::from_corners(source, target)
    }

    fn edge_info(inner: &Inner, id: EdgeId, edge: &EdgeData) -> EdgeInfo {
        let source = &inner.nodes[edge.source.0 as usize];
        let target = &inner.nodes[edge.target.0 as usize];
        EdgeInfo {
            id,
            source: edge.source,
            target: edge.target,
            source_position: source.position,
            target_position: target.position,
            weight: edge.weight,
            directed: edge.directed,
            color: edge.color,
            source_color: source.color,
            target_color: target.color,
            target_size: target.size,
        }
    }
}

impl GraphIndex for MemoryGraph {
    fn visible_nodes(&self, view: Rect2D, out: &mut Vec<NodeInfo>) {
        let inner = self.inner.read().unwrap();
        for (i, node) in inner.nodes.iter().enumerate() {
            if Self::node_rect(node).intersects(view) {
                out.push(NodeInfo {
                    id: NodeId(i as u32),
                    position: node.position,
                    size: node.size,
                    color: node.color,
                });
            }
        }
    }

    fn visible_edges(&self, view: Rect2D, out: &mut Vec<EdgeInfo>) {
        let inner = self.inner.read().unwrap();
        for (i, edge) in inner.edges.iter().enumerate() {
            if Self::edge_rect(&inner, edge).intersects(view) {
                out.push(Self::edge_info(&inner, EdgeId(i as u32), edge));
            }
        }
    }

    fn visible_node_count(&self, view: Rect2D) -> usize {
        let inner = self.inner.read().unwrap();
        inner
            .nodes
            .iter()
            .filter(|n| Self::node_rect(n).intersects(view))
            .count()
    }

    fn visible_edge_count(&self, view: Rect2D) -> usize {
        let inner = self.inner.read().unwrap();
        inner
            .edges
            .iter()
            .filter(|e| Self::edge_rect(&inner, e).intersects(view))
            .count()
    }

    fn node_under_position(&self, position: Vec2) -> Option<NodeId> {
        let inner = self.inner.read().unwrap();
        // Later nodes draw on top, so scan back to front.
        for (i, node) in inner.nodes.iter().enumerate().rev() {
            if (node.position - position).length() <= node.size {
                return Some(NodeId(i as u32));
            }
        }
        None
    }

    fn nodes_inside_rectangle(&self, rect: Rect2D, out: &mut Vec<NodeId>) {
        let inner = self.inner.read().unwrap();
        for (i, node) in inner.nodes.iter().enumerate() {
            if rect.contains(node.position) {
                out.push(NodeId(i as u32));
            }
        }
    }

    fn neighbors(&self, node: NodeId, out: &mut Vec<NodeId>) {
        let inner = self.inner.read().unwrap();
        for edge in &inner.edges {
            if edge.source == node {
                out.push(edge.target);
            } else if edge.target == node {
                out.push(edge.source);
            }
        }
    }

    fn edges_of(&self, node: NodeId, out: &mut Vec<EdgeId>) {
        let inner = self.inner.read().unwrap();
        for (i, edge) in inner.edges.iter().enumerate() {
            if edge.source == node || edge.target == node {
                out.push(EdgeId(i as u32));
            }
        }
    }

    fn edges_weight_bounds(&self, view: Rect2D) -> (f32, f32) {
        let inner = self.inner.read().unwrap();
        let mut bounds: Option<(f32, f32)> = None;
        for edge in &inner.edges {
            if Self::edge_rect(&inner, edge).intersects(view) {
                let (min, max) = bounds.get_or_insert((edge.weight, edge.weight));
                *min = min.min(edge.weight);
                *max = max.max(edge.weight);
            }
        }
        bounds.unwrap_or((0.0, 1.0))
    }

    fn graph_boundaries(&self) -> Rect2D {
        let inner = self.inner.read().unwrap();
        let mut bounds: Option<Rect2D> = None;
        for node in &inner.nodes {
            let rect = Self::node_rect(node);
            bounds = Some(match bounds {
                Some(b) => b.union(rect),
                None => rect,
            });
        }
        bounds.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MemoryGraph, NodeId, NodeId, NodeId) {
        let g = MemoryGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0), 5.0, Color::WHITE);
        let b = g.add_node(Vec2::new(100.0, 0.0), 5.0, Color::WHITE);
        let c = g.add_node(Vec2::new(200.0, 0.0), 5.0, Color::WHITE);
        g.add_edge(a, b, 1.0, false, None);
        g.add_edge(b, c, 2.0, true, None);
        (g, a, b, c)
    }

    #[test]
    fn visibility_filters_by_rectangle() {
        let (g, ..) = sample();
        let view = Rect2D::new(-10.0, -10.0, 50.0, 10.0);

        assert_eq!(g.visible_node_count(view), 1);
        // Edge a-b spans x 0..100 and clips the view.
        assert_eq!(g.visible_edge_count(view), 1);

        let everything = Rect2D::new(-1000.0, -1000.0, 1000.0, 1000.0);
        assert_eq!(g.visible_node_count(everything), 3);
        assert_eq!(g.visible_edge_count(everything), 2);
    }

    #[test]
    fn node_under_position_respects_radius() {
        let (g, a, ..) = sample();
        assert_eq!(g.node_under_position(Vec2::new(3.0, 0.0)), Some(a));
        assert_eq!(g.node_under_position(Vec2::new(20.0, 0.0)), None);
    }

    #[test]
    fn neighbors_and_incident_edges() {
        let (g, a, b, c) = sample();

        let mut neighbors = Vec::new();
        g.neighbors(b, &mut neighbors);
        assert_eq!(neighbors, vec![a, c]);

        let mut edges = Vec::new();
        g.edges_of(b, &mut edges);
        assert_eq!(edges, vec![EdgeId(0), EdgeId(1)]);
    }

    #[test]
    fn weight_bounds_default_when_empty() {
        let g = MemoryGraph::new();
        assert_eq!(
            g.edges_weight_bounds(Rect2D::new(-1.0, -1.0, 1.0, 1.0)),
            (0.0, 1.0)
        );

        let (g, ..) = sample();
        let everything = Rect2D::new(-1000.0, -1000.0, 1000.0, 1000.0);
        assert_eq!(g.edges_weight_bounds(everything), (1.0, 2.0));
    }

    #[test]
    fn graph_boundaries_cover_node_bodies() {
        let (g, ..) = sample();
        let bounds = g.graph_boundaries();
        assert_eq!(bounds, Rect2D::new(-5.0, -5.0, 205.0, 5.0));
    }
}

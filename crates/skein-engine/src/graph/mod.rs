//! External graph collaborator seam.
//!
//! The engine never owns or mutates graph data. It reads entities through the
//! [`GraphIndex`] trait and tracks which of them are selected in a
//! [`SelectionModel`] shared with the input logic and the streaming engine.

mod memory;
mod selection;

pub use memory::MemoryGraph;
pub use selection::{EdgeSelectionKind, SelectionModel};

use glam::Vec2;

use crate::coords::{Color, Rect2D};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// Copyable node view handed out by the index.
#[derive(Debug, Copy, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub position: Vec2,
    pub size: f32,
    pub color: Color,
}

/// Copyable edge view handed out by the index.
///
/// `color` is `None` when the edge has no color of its own; the streaming
/// engine then falls back to endpoint colors.
#[derive(Debug, Copy, Clone)]
pub struct EdgeInfo {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_position: Vec2,
    pub target_position: Vec2,
    pub weight: f32,
    pub directed: bool,
    pub color: Option<Color>,
    pub source_color: Color,
    pub target_color: Color,
    pub target_size: f32,
}

/// Read-only spatial/graph queries the engine depends on.
///
/// Implementations must be callable from update workers, hence
/// `Send + Sync`; the engine promises tick-granular read consistency only.
pub trait GraphIndex: Send + Sync {
    /// Appends nodes intersecting `view` to `out` in stable order.
    fn visible_nodes(&self, view: Rect2D, out: &mut Vec<NodeInfo>);

    /// Appends edges intersecting `view` to `out` in stable order.
    fn visible_edges(&self, view: Rect2D, out: &mut Vec<EdgeInfo>);

    fn visible_node_count(&self, view: Rect2D) -> usize;

    fn visible_edge_count(&self, view: Rect2D) -> usize;

    /// Topmost node whose body covers `position`, if any.
    fn node_under_position(&self, position: Vec2) -> Option<NodeId>;

    fn nodes_inside_rectangle(&self, rect: Rect2D, out: &mut Vec<NodeId>);

    fn neighbors(&self, node: NodeId, out: &mut Vec<NodeId>);

    /// Edges incident to `node`.
    fn edges_of(&self, node: NodeId, out: &mut Vec<EdgeId>);

    /// `(min, max)` weight across edges intersecting `view`; `(0, 1)` when
    /// no edge is visible so downstream scaling stays well-defined.
    fn edges_weight_bounds(&self, view: Rect2D) -> (f32, f32);

    /// Bounding rectangle of all node bodies.
    fn graph_boundaries(&self) -> Rect2D;
}

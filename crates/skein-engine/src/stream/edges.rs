use std::ops::Range;

use crate::coords::Rect2D;
use crate::graph::{EdgeInfo, EdgeSelectionKind, GraphIndex, SelectionModel};
use crate::settings::RenderingOptions;

use super::{AttributeBuffer, InstanceCounter};

/// Floats per edge record. Undirected layout: source xy, target xy, width,
/// source color, target color, override color. Directed layout: source xy,
/// target xy, width, source color, override color, target size. Both kinds
/// share the stride so they can live in one flat array.
///
/// Width is the edge weight normalized against the visible weight bounds and
/// scaled by `edge_scale`. The override color is zero bits when the edge has
/// no color of its own and no selection recolors it; the shader then falls
/// back to the endpoint colors.
pub const EDGE_ATTRIBS_STRIDE: usize = 8;

/// On-screen vertices per undirected edge (a quad, two triangles).
pub const UNDIRECTED_EDGE_VERTEX_COUNT: usize = 6;

/// On-screen vertices per directed edge (a quad plus an arrow head).
pub const DIRECTED_EDGE_VERTEX_COUNT: usize = 9;

/// Per-tick edge attribute state shared between the edge updater and the
/// edge renderer.
///
/// The flat array is laid out in four stable blocks: undirected unselected,
/// undirected selected, directed unselected, directed selected. Unselected
/// blocks precede selected ones so selected edges render on top; the
/// directed/undirected split exists because the two kinds use different
/// vertex geometry and shader attribute layouts.
#[derive(Debug)]
pub struct EdgeStreamData {
    undirected: InstanceCounter,
    directed: InstanceCounter,
    attributes: AttributeBuffer,
    scratch: Vec<EdgeInfo>,
}

impl EdgeStreamData {
    pub fn new() -> Self {
        Self {
            undirected: InstanceCounter::new(),
            directed: InstanceCounter::new(),
            attributes: AttributeBuffer::new(EDGE_ATTRIBS_STRIDE),
            scratch: Vec::new(),
        }
    }

    pub fn undirected_counter(&self) -> &InstanceCounter {
        &self.undirected
    }

    pub fn directed_counter(&self) -> &InstanceCounter {
        &self.directed
    }

    pub fn attributes(&self) -> &AttributeBuffer {
        &self.attributes
    }

    /// Record range to draw for the undirected kind on the given layer.
    pub fn undirected_draw_range(&self, back_layer: bool) -> Range<usize> {
        if back_layer {
            0..self.undirected.unselected_to_draw()
        } else {
            self.undirected.unselected_to_draw()..self.undirected.total_to_draw()
        }
    }

    /// Record range to draw for the directed kind on the given layer.
    pub fn directed_draw_range(&self, back_layer: bool) -> Range<usize> {
        let base = self.undirected.total_to_draw();
        if back_layer {
            base..base + self.directed.unselected_to_draw()
        } else {
            base + self.directed.unselected_to_draw()..base + self.directed.total_to_draw()
        }
    }

    /// Commits this tick's counts to the render phase. Must run strictly
    /// after [`EdgeStreamData::update`] finished populating the arrays.
    pub fn promote(&mut self) {
        self.undirected.promote();
        self.directed.promote();
    }

    /// Recomputes attributes and write-side counts from the current
    /// graph/selection/options state.
    pub fn update(
        &mut self,
        graph: &dyn GraphIndex,
        view: Rect2D,
        selection: &SelectionModel,
        options: &RenderingOptions,
    ) {
        let Self {
            undirected,
            directed,
            attributes,
            scratch,
        } = self;

        if !options.show_edges {
            undirected.clear_counts();
            directed.clear_counts();
            return;
        }

        scratch.clear();
        graph.visible_edges(view, scratch);
        attributes.begin(scratch.len());

        let (min_weight, max_weight) = graph.edges_weight_bounds(view);
        let width_of = |weight: f32| -> f32 {
            if max_weight > min_weight {
                let t = (weight - min_weight) / (max_weight - min_weight);
                1.0 + t * (options.edge_scale - 1.0)
            } else {
                1.0
            }
        };

        let some_edges_selection = selection.selected_edge_count() > 0;
        let some_nodes_selection = selection.selected_node_count() > 0;
        let hide_non_selected = some_edges_selection && options.effectively_hides_non_selected();

        for kind_directed in [false, true] {
            let mut unselected = 0;
            let mut selected = 0;

            if some_edges_selection {
                if hide_non_selected {
                    for edge in scratch.iter().filter(|e| e.directed == kind_directed) {
                        if !selection.is_edge_selected(edge.id) {
                            continue;
                        }
                        selected += 1;
                        fill_record(
                            attributes.next_record(),
                            edge,
                            width_of(edge.weight),
                            true,
                            selection,
                            options,
                            some_nodes_selection,
                        );
                    }
                } else {
                    // Unselected first so they render underneath.
                    for edge in scratch.iter().filter(|e| e.directed == kind_directed) {
                        if selection.is_edge_selected(edge.id) {
                            continue;
                        }
                        unselected += 1;
                        fill_record(
                            attributes.next_record(),
                            edge,
                            width_of(edge.weight),
                            false,
                            selection,
                            options,
                            some_nodes_selection,
                        );
                    }

                    // Then selected ones, on top.
                    for edge in scratch.iter().filter(|e| e.directed == kind_directed) {
                        if !selection.is_edge_selected(edge.id) {
                            continue;
                        }
                        selected += 1;
                        fill_record(
                            attributes.next_record(),
                            edge,
                            width_of(edge.weight),
                            true,
                            selection,
                            options,
                            some_nodes_selection,
                        );
                    }
                }
            } else {
                // No selection: everything draws once, at full color, in the
                // front pass.
                for edge in scratch.iter().filter(|e| e.directed == kind_directed) {
                    selected += 1;
                    fill_record(
                        attributes.next_record(),
                        edge,
                        width_of(edge.weight),
                        true,
                        selection,
                        options,
                        some_nodes_selection,
                    );
                }
            }

            let counter = if kind_directed {
                &mut *directed
            } else {
                &mut *undirected
            };
            counter.set_counts(unselected, selected);
        }
    }
}

impl Default for EdgeStreamData {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_record(
    record: &mut [f32],
    edge: &EdgeInfo,
    width: f32,
    selected: bool,
    selection: &SelectionModel,
    options: &RenderingOptions,
    some_nodes_selection: bool,
) {
    record[0] = edge.source_position.x;
    record[1] = edge.source_position.y;
    record[2] = edge.target_position.x;
    record[3] = edge.target_position.y;
    record[4] = width;
    record[5] = edge.source_color.to_bits();

    let color = resolve_color(edge, selected, selection, options, some_nodes_selection);
    if edge.directed {
        record[6] = color;
        record[7] = edge.target_size;
    } else {
        record[6] = edge.target_color.to_bits();
        record[7] = color;
    }
}

/// Selection-resolved override color, packed; zero bits when the edge keeps
/// its endpoint-derived coloring.
///
/// Selected edges can take a directional highlight color distinguishing
/// which endpoints are selected; edges without a color of their own inherit
/// the color of the endpoint opposite to the selected one.
fn resolve_color(
    edge: &EdgeInfo,
    selected: bool,
    selection: &SelectionModel,
    options: &RenderingOptions,
    some_nodes_selection: bool,
) -> f32 {
    let own_color = || edge.color.map_or(0.0, |c| c.to_bits());

    if !selected {
        return own_color();
    }

    if some_nodes_selection && options.edge_selection_color {
        match selection.edge_endpoint_selection(edge.source, edge.target) {
            EdgeSelectionKind::Both => options.edge_both_selection_color.to_bits(),
            EdgeSelectionKind::SourceOnly => options.edge_out_selection_color.to_bits(),
            EdgeSelectionKind::TargetOnly => options.edge_in_selection_color.to_bits(),
            EdgeSelectionKind::Neither => own_color(),
        }
    } else if some_nodes_selection && edge.color.is_none() {
        if selection.is_node_selected(edge.source) {
            edge.target_color.to_bits()
        } else {
            edge.source_color.to_bits()
        }
    } else {
        own_color()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use glam::Vec2;

    use crate::coords::Color;
    use crate::graph::{EdgeId, MemoryGraph, NodeId};

    use super::*;

    const VIEW: Rect2D = Rect2D::new(-1000.0, -1000.0, 1000.0, 1000.0);

    /// a-b and c-d undirected, e->f directed.
    fn sample() -> (MemoryGraph, Vec<NodeId>, Vec<EdgeId>) {
        let g = MemoryGraph::new();
        let nodes: Vec<NodeId> = (0..6)
            .map(|i| g.add_node(Vec2::new(i as f32 * 10.0, 0.0), 1.0, Color::WHITE))
            .collect();
        let edges = vec![
            g.add_edge(nodes[0], nodes[1], 1.0, false, None),
            g.add_edge(nodes[2], nodes[3], 2.0, false, None),
            g.add_edge(nodes[4], nodes[5], 3.0, true, None),
        ];
        (g, nodes, edges)
    }

    #[test]
    fn no_selection_everything_in_front_pass() {
        let (g, _, _) = sample();
        let mut data = EdgeStreamData::new();
        data.update(&g, VIEW, &SelectionModel::new(), &RenderingOptions::default());
        data.promote();

        assert_eq!(data.undirected_counter().unselected_to_draw(), 0);
        assert_eq!(data.undirected_counter().selected_to_draw(), 2);
        assert_eq!(data.directed_counter().selected_to_draw(), 1);

        assert_eq!(data.undirected_draw_range(true), 0..0);
        assert_eq!(data.undirected_draw_range(false), 0..2);
        assert_eq!(data.directed_draw_range(false), 2..3);
    }

    #[test]
    fn unselected_populate_before_selected() {
        let (g, _, edges) = sample();
        let mut selection = SelectionModel::new();
        selection.set_selection(HashSet::new(), [edges[1]].into());

        let mut data = EdgeStreamData::new();
        data.update(&g, VIEW, &selection, &RenderingOptions::default());
        data.promote();

        assert_eq!(data.undirected_counter().unselected_to_draw(), 1);
        assert_eq!(data.undirected_counter().selected_to_draw(), 1);

        // Record 0 is the unselected a-b edge, record 1 the selected c-d one.
        let first = data.attributes().records(0..1);
        assert_eq!(first[0], 0.0); // a.x
        let second = data.attributes().records(1..2);
        assert_eq!(second[0], 20.0); // c.x
    }

    #[test]
    fn hide_non_selected_drops_unselected() {
        let (g, _, edges) = sample();
        let mut selection = SelectionModel::new();
        selection.set_selection(HashSet::new(), [edges[0]].into());

        let mut options = RenderingOptions::default();
        options.hide_non_selected = true;

        let mut data = EdgeStreamData::new();
        data.update(&g, VIEW, &selection, &options);
        data.promote();

        assert_eq!(data.undirected_counter().unselected_to_draw(), 0);
        assert_eq!(data.undirected_counter().selected_to_draw(), 1);
        assert_eq!(data.directed_counter().total_to_draw(), 0);
    }

    #[test]
    fn show_edges_off_clears_counts() {
        let (g, _, _) = sample();
        let mut options = RenderingOptions::default();
        options.show_edges = false;

        let mut data = EdgeStreamData::new();
        data.update(&g, VIEW, &SelectionModel::new(), &options);
        data.promote();

        assert_eq!(data.undirected_counter().total_to_draw(), 0);
        assert_eq!(data.directed_counter().total_to_draw(), 0);
    }

    #[test]
    fn directed_block_follows_undirected_block() {
        let (g, _, edges) = sample();
        let mut selection = SelectionModel::new();
        selection.set_selection(HashSet::new(), [edges[2]].into());

        let mut data = EdgeStreamData::new();
        data.update(&g, VIEW, &selection, &RenderingOptions::default());
        data.promote();

        // Two unselected undirected edges, then the selected directed one.
        assert_eq!(data.undirected_draw_range(true), 0..2);
        assert_eq!(data.directed_draw_range(true), 2..2);
        assert_eq!(data.directed_draw_range(false), 2..3);

        let directed = data.attributes().records(2..3);
        assert_eq!(directed[0], 40.0); // e.x
        assert_eq!(directed[7], 1.0); // target size lane
    }

    #[test]
    fn widths_normalize_against_visible_weight_bounds() {
        let (g, _, _) = sample();
        let mut data = EdgeStreamData::new();
        // Default edge_scale 2.0, weights 1..3 map to widths 1.0..2.0.
        data.update(&g, VIEW, &SelectionModel::new(), &RenderingOptions::default());
        data.promote();

        let widths: Vec<f32> = data
            .attributes()
            .records(0..3)
            .chunks_exact(EDGE_ATTRIBS_STRIDE)
            .map(|r| r[4])
            .collect();
        assert_eq!(widths, vec![1.0, 1.5, 2.0]);
    }

    #[test]
    fn directional_highlight_colors() {
        let g = MemoryGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0), 1.0, Color::rgb(0.1, 0.1, 0.1));
        let b = g.add_node(Vec2::new(10.0, 0.0), 1.0, Color::rgb(0.2, 0.2, 0.2));
        let c = g.add_node(Vec2::new(20.0, 0.0), 1.0, Color::rgb(0.3, 0.3, 0.3));
        let out_edge = g.add_edge(a, b, 1.0, true, None);
        let in_edge = g.add_edge(c, a, 1.0, true, None);

        let mut selection = SelectionModel::new();
        selection.set_selection([a].into(), [out_edge, in_edge].into());

        let mut options = RenderingOptions::default();
        options.edge_selection_color = true;

        let mut data = EdgeStreamData::new();
        data.update(&g, VIEW, &selection, &options);
        data.promote();

        // Both records are selected directed edges; color sits in lane 6.
        let records = data.attributes().records(data.directed_draw_range(false));
        let colors: Vec<f32> = records
            .chunks_exact(EDGE_ATTRIBS_STRIDE)
            .map(|r| r[6])
            .collect();
        assert_eq!(
            colors,
            vec![
                options.edge_out_selection_color.to_bits(), // a -> b, source selected
                options.edge_in_selection_color.to_bits(),  // c -> a, target selected
            ]
        );
    }

    #[test]
    fn colorless_selected_edge_inherits_opposite_endpoint() {
        let g = MemoryGraph::new();
        let a = g.add_node(Vec2::new(0.0, 0.0), 1.0, Color::rgb(0.1, 0.1, 0.1));
        let b = g.add_node(Vec2::new(10.0, 0.0), 1.0, Color::rgb(0.6, 0.6, 0.6));
        let e = g.add_edge(a, b, 1.0, false, None);

        let mut selection = SelectionModel::new();
        selection.set_selection([a].into(), [e].into());

        let mut data = EdgeStreamData::new();
        data.update(&g, VIEW, &selection, &RenderingOptions::default());
        data.promote();

        let record = data.attributes().records(0..1);
        // Source is selected, so the edge shows the target's color.
        assert_eq!(record[7], Color::rgb(0.6, 0.6, 0.6).to_bits());
    }
}

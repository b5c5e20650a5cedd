use std::ops::Range;

use crate::coords::Rect2D;
use crate::graph::{GraphIndex, NodeInfo, SelectionModel};
use crate::settings::RenderingOptions;

use super::{AttributeBuffer, InstanceCounter};

/// Floats per node record: position xy, size, packed color.
pub const NODE_ATTRIBS_STRIDE: usize = 4;

/// On-screen vertices per node disc (a quad, two triangles).
pub const NODE_VERTEX_COUNT: usize = 6;

/// Per-tick node attribute state shared between the node updater and the
/// node renderer. Unselected records precede selected ones in the flat
/// array, same as the edge stream.
#[derive(Debug)]
pub struct NodeStreamData {
    counter: InstanceCounter,
    attributes: AttributeBuffer,
    scratch: Vec<NodeInfo>,
}

impl NodeStreamData {
    pub fn new() -> Self {
        Self {
            counter: InstanceCounter::new(),
            attributes: AttributeBuffer::new(NODE_ATTRIBS_STRIDE),
            scratch: Vec::new(),
        }
    }

    pub fn counter(&self) -> &InstanceCounter {
        &self.counter
    }

    pub fn attributes(&self) -> &AttributeBuffer {
        &self.attributes
    }

    /// Record range to draw on the given layer.
    pub fn draw_range(&self, back_layer: bool) -> Range<usize> {
        if back_layer {
            0..self.counter.unselected_to_draw()
        } else {
            self.counter.unselected_to_draw()..self.counter.total_to_draw()
        }
    }

    /// Commits this tick's counts to the render phase. Must run strictly
    /// after [`NodeStreamData::update`] finished populating the arrays.
    pub fn promote(&mut self) {
        self.counter.promote();
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
            counter,
            attributes,
            scratch,
        } = self;

        if !options.show_nodes {
            counter.clear_counts();
            return;
        }

        scratch.clear();
        graph.visible_nodes(view, scratch);
        attributes.begin(scratch.len());

        // Neighbours of the selection count as selected for rendering.
        let treat_selected =
            |node: &NodeInfo| selection.is_node_selected(node.id) || selection.is_neighbour(node.id);

        let mut unselected = 0;
        let mut selected = 0;

        if selection.some_selection() {
            if options.effectively_hides_non_selected() {
                for node in scratch.iter().filter(|n| treat_selected(n)) {
                    selected += 1;
                    fill_record(attributes.next_record(), node);
                }
            } else {
                // Unselected first so they render underneath.
                for node in scratch.iter().filter(|n| !treat_selected(n)) {
                    unselected += 1;
                    fill_record(attributes.next_record(), node);
                }
                for node in scratch.iter().filter(|n| treat_selected(n)) {
                    selected += 1;
                    fill_record(attributes.next_record(), node);
                }
            }
        } else {
            for node in scratch.iter() {
                selected += 1;
                fill_record(attributes.next_record(), node);
            }
        }

        counter.set_counts(unselected, selected);
    }
}

impl Default for NodeStreamData {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_record(record: &mut [f32], node: &NodeInfo) {
    record[0] = node.position.x;
    record[1] = node.position.y;
    record[2] = node.size;
    record[3] = node.color.to_bits();
}

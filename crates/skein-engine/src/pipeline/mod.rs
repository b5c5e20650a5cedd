//! Pipeline elements and the capability-based composer.
//!
//! Every responsibility (rendering a category of drawables, updating its
//! world data, handling input) is an explicitly registered element. At
//! `init_pipeline` time the composer picks, per category, the best
//! implementation available on the active backend and orders the winners
//! into an execution pipeline.

mod composer;
mod element;
mod layer;

pub use composer::compose;
pub use element::{InputListener, PipelineElement, RenderContext, Renderer, WorldUpdater};
pub use layer::{ALL_LAYERS, LayerSet, RenderingLayer};

/// Well-known responsibility categories.
pub mod category {
    pub const EDGE: &str = "edge";
    pub const NODE: &str = "node";
    pub const SELECTION_OVERLAY: &str = "selection-overlay";
    pub const INPUT: &str = "input";
}

/// Execution-order anchors for the standard categories. Lower draws first.
pub mod order {
    pub const EDGES: i32 = 100;
    pub const NODES: i32 = 200;
    pub const SELECTION_OVERLAY: i32 = 300;
}

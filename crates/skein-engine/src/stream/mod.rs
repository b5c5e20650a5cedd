//! Batched attribute streaming engine.
//!
//! Each update tick reads visible graph entities, computes per-entity GPU
//! attributes into flat fixed-stride arrays partitioned by selection state,
//! and publishes the new instance counts through an explicit promote step.
//! At render time the arrays are consumed in bounded-size batches so a single
//! buffer upload never exceeds a safe size.

mod attributes;
mod batch;
mod counter;
mod edges;
mod nodes;

pub use attributes::AttributeBuffer;
pub use batch::{EDGE_BATCH_SIZE, NODE_BATCH_SIZE, batch_ranges, replicate_records};
pub use counter::InstanceCounter;
pub use edges::{
    DIRECTED_EDGE_VERTEX_COUNT, EDGE_ATTRIBS_STRIDE, EdgeStreamData, UNDIRECTED_EDGE_VERTEX_COUNT,
};
pub use nodes::{NODE_ATTRIBS_STRIDE, NODE_VERTEX_COUNT, NodeStreamData};

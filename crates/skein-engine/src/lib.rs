//! Skein engine crate.
//!
//! Skein renders large node-link graphs at interactive frame rates. The graph
//! itself is an external collaborator consumed read-only through the
//! [`graph::GraphIndex`] trait; skein owns the frame scheduler, the
//! capability-based pipeline composer, the camera transform and the batched
//! attribute streaming that turns graph entities into GPU draw calls.

pub mod backend_wgpu;
pub mod camera;
pub mod coords;
pub mod engine;
pub mod error;
pub mod graph;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod stream;
pub mod target;

pub use engine::Engine;
pub use error::{EngineError, Result};

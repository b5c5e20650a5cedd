use glam::Mat4;

use crate::coords::Rect2D;
use crate::input::InputContext;
use crate::pipeline::{LayerSet, RenderingLayer};
use crate::target::{Capabilities, RenderingTarget};

/// Common contract of every registered pipeline element.
///
/// Elements are created at configuration time and immutable in their
/// identity fields thereafter; the composer re-evaluates availability
/// wholesale whenever the pipeline is rebuilt.
pub trait PipelineElement {
    fn name(&self) -> &str;

    /// Responsibility category tag; at most one element per category is
    /// active in the built pipeline.
    fn category(&self) -> &str;

    /// Higher wins within a category. Ties resolve first-registered, which
    /// the composer flags as a configuration smell.
    fn preference_in_category(&self) -> i32 {
        0
    }

    /// Position in the built pipeline, ascending.
    fn order(&self) -> i32 {
        0
    }

    fn is_available(&self, _capabilities: &Capabilities) -> bool {
        true
    }
}

/// Per-frame data handed to renderers, snapshotted from the camera by the
/// frame scheduler.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub mvp: Mat4,
    pub mvp_floats: [f32; 16],
    pub view_boundaries: Rect2D,
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
    pub background_color: [f32; 4],
}

/// Issues draw calls for one category of drawables.
pub trait Renderer<T: RenderingTarget>: PipelineElement {
    fn init(&mut self, _target: &mut T) -> anyhow::Result<()> {
        Ok(())
    }

    fn dispose(&mut self, _target: &mut T) {}

    /// Called on the frame thread strictly after an update batch completed;
    /// the conventional place to promote instance counters.
    fn world_updated(&mut self, _target: &mut T) {}

    /// Layers this renderer participates in.
    fn layers(&self) -> LayerSet;

    fn render(
        &mut self,
        target: &mut T,
        layer: RenderingLayer,
        ctx: &RenderContext,
    ) -> anyhow::Result<()>;
}

/// Recomputes world data (GPU-ready attributes) for one category.
///
/// Updaters may run on worker threads in the concurrent execution modes, so
/// they share state with their paired renderer through interior mutability
/// (conventionally a mutex around the stream data).
pub trait WorldUpdater: PipelineElement + Send + Sync {
    fn init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn dispose(&self) {}

    fn update_world(&self) -> anyhow::Result<()>;
}

/// Translates queued input events into camera/selection mutations.
pub trait InputListener<E>: PipelineElement {
    /// Frame-start signal, before any event of the frame is dispatched.
    fn frame_start(&mut self) {}

    /// Frame-end signal, after the whole event batch was dispatched.
    fn frame_end(&mut self) {}

    /// Returns true when the event was consumed; consumed events are not
    /// offered to listeners later in the pipeline.
    fn process_event(&mut self, event: &E, ctx: &mut InputContext<'_>) -> bool;
}

//! Backend/target collaborator seam.
//!
//! The engine drives a [`RenderingTarget`] through its lifecycle and frame
//! hooks but never touches a graphics API directly; availability predicates
//! of pipeline elements query the target's [`Capabilities`] to decide which
//! implementation can run on it.

/// Optional draw features the active backend exposes.
///
/// `disable_instanced` is an operator override that forces the
/// non-instanced fallbacks even when the hardware could instance.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub instanced_draws: bool,
    pub base_instance: bool,
    pub disable_instanced: bool,
}

impl Capabilities {
    /// Effective instancing availability after the operator override.
    pub fn can_instance(&self) -> bool {
        self.instanced_draws && !self.disable_instanced
    }
}

/// Lifecycle and per-frame hooks of a rendering backend.
pub trait RenderingTarget {
    /// Called once from `Engine::start` before the first frame.
    fn setup(&mut self) {}

    fn start(&mut self) {}

    fn stop(&mut self) {}

    fn frame_start(&mut self) {}

    fn frame_end(&mut self) {}

    fn capabilities(&self) -> Capabilities;
}

/// Target without a GPU behind it.
///
/// Used by tests and by embedders that submit draw data through their own
/// rendering stack; records lifecycle calls so scheduler behavior can be
/// asserted.
#[derive(Debug, Default)]
pub struct HeadlessTarget {
    pub capabilities: Capabilities,
    pub setup_calls: usize,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub frames: usize,
}

impl HeadlessTarget {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            ..Default::default()
        }
    }
}

impl RenderingTarget for HeadlessTarget {
    fn setup(&mut self) {
        self.setup_calls += 1;
    }

    fn start(&mut self) {
        self.start_calls += 1;
    }

    fn stop(&mut self) {
        self.stop_calls += 1;
    }

    fn frame_start(&mut self) {
        self.frames += 1;
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }
}

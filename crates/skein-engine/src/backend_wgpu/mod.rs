//! Reference wgpu backend.
//!
//! The embedder owns the surface and swapchain; per frame it attaches a
//! texture view with [`WgpuTarget::begin_frame`], runs `Engine::display`,
//! and the target submits the recorded commands on `frame_end`. The pipeline
//! elements in this module come in instanced/array-draw pairs so the
//! composer can pick per the target's capabilities.

mod common;
mod edges;
mod nodes;
mod overlay;

pub use edges::{EdgeRenderer, EdgeWorldUpdater};
pub use nodes::{NodeRenderer, NodeWorldUpdater};
pub use overlay::SelectionOverlayRenderer;

use std::sync::{Arc, Mutex, RwLock};

use anyhow::Context as _;

use crate::camera::Camera;
use crate::engine::Engine;
use crate::graph::{GraphIndex, SelectionModel};
use crate::input::{DefaultInputListener, InputEvent};
use crate::settings::RenderingOptions;
use crate::stream::{EdgeStreamData, NodeStreamData};
use crate::target::{Capabilities, RenderingTarget};

/// Encoder and color view for the frame currently being recorded.
pub struct WgpuFrame {
    pub encoder: wgpu::CommandEncoder,
    pub view: wgpu::TextureView,
}

/// Tracks whether the current frame's attachment has been cleared yet, and
/// which color to fall back to when no render pass ran at all.
struct ClearState {
    cleared: bool,
    background: [f32; 4],
}

impl ClearState {
    fn new(background: [f32; 4]) -> Self {
        Self {
            cleared: false,
            background,
        }
    }

    fn reset(&mut self) {
        self.cleared = false;
    }

    fn load_op(&mut self, background: [f32; 4]) -> wgpu::LoadOp<wgpu::Color> {
        self.background = background;
        if self.cleared {
            wgpu::LoadOp::Load
        } else {
            self.cleared = true;
            wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(background[0]),
                g: f64::from(background[1]),
                b: f64::from(background[2]),
                a: f64::from(background[3]),
            })
        }
    }

    /// The clear still owed for this frame, if no pass opened one.
    fn pending_clear(&mut self) -> Option<wgpu::LoadOp<wgpu::Color>> {
        if self.cleared {
            None
        } else {
            Some(self.load_op(self.background))
        }
    }
}

/// [`RenderingTarget`] over a caller-provided wgpu device and queue.
pub struct WgpuTarget {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    disable_instanced: bool,
    frame: Option<WgpuFrame>,
    clear: ClearState,
}

impl WgpuTarget {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            disable_instanced: false,
            frame: None,
            clear: ClearState::new([1.0, 1.0, 1.0, 1.0]),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Operator override forcing the array-draw fallbacks. Takes effect at
    /// the next `init_pipeline`.
    pub fn set_disable_instanced(&mut self, disable: bool) {
        self.disable_instanced = disable;
    }

    /// Fallback clear color for frames where no renderer opens a pass, so an
    /// empty scene still shows the configured background rather than stale
    /// surface contents. Keep in sync with `Engine::set_background_color`.
    pub fn set_background_color(&mut self, background: [f32; 4]) {
        self.clear.background = background;
    }

    /// Attaches the color view to render the next frame into. Call before
    /// `Engine::display`; without an attached frame renderers are no-ops.
    pub fn begin_frame(&mut self, view: wgpu::TextureView) {
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("skein frame encoder"),
            });
        self.frame = Some(WgpuFrame { encoder, view });
    }

    pub fn frame_mut(&mut self) -> Option<&mut WgpuFrame> {
        self.frame.as_mut()
    }

    /// Load op for the next render pass: the first pass of a frame clears to
    /// the background color, later passes load.
    pub fn color_load_op(&mut self, background: [f32; 4]) -> wgpu::LoadOp<wgpu::Color> {
        self.clear.load_op(background)
    }
}

impl RenderingTarget for WgpuTarget {
    fn frame_start(&mut self) {
        self.clear.reset();
    }

    fn frame_end(&mut self) {
        if let Some(mut frame) = self.frame.take() {
            // No renderer opened a pass this frame; clear the attachment by
            // itself before submitting.
            if let Some(load) = self.clear.pending_clear() {
                frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("skein clear pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });
            }
            self.queue.submit(std::iter::once(frame.encoder.finish()));
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            instanced_draws: true,
            base_instance: true,
            disable_instanced: self.disable_instanced,
        }
    }
}

/// Creates a windowless device and queue, for offscreen rendering and
/// element tests.
pub fn create_headless_device() -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .context("failed to find a suitable GPU adapter")?;

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("skein-engine device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .context("failed to create wgpu device/queue")?;

    Ok((device, queue))
}

/// Shared handles a stream updater reads every tick.
#[derive(Clone)]
pub struct StreamSources {
    pub graph: Arc<dyn GraphIndex>,
    pub camera: Arc<RwLock<Camera>>,
    pub selection: Arc<RwLock<SelectionModel>>,
    pub options: Arc<RwLock<RenderingOptions>>,
}

impl StreamSources {
    pub fn from_engine<T: RenderingTarget, E>(engine: &Engine<T, E>) -> Self {
        Self {
            graph: engine.graph(),
            camera: engine.camera(),
            selection: engine.selection(),
            options: engine.rendering_options(),
        }
    }
}

/// Registers the stock element set: edge and node updater/renderer pairs
/// (instanced preferred, array-draw fallback), the selection rectangle
/// overlay and the default input listener. Call `init_pipeline` afterwards.
pub fn register_default_elements(engine: &mut Engine<WgpuTarget, InputEvent>) {
    let sources = StreamSources::from_engine(engine);

    let edge_stream = Arc::new(Mutex::new(EdgeStreamData::new()));
    engine.add_world_updater(Arc::new(EdgeWorldUpdater::new(
        edge_stream.clone(),
        sources.clone(),
    )));
    engine.add_renderer(Box::new(EdgeRenderer::instanced(
        edge_stream.clone(),
        sources.options.clone(),
    )));
    engine.add_renderer(Box::new(EdgeRenderer::array_draw(
        edge_stream,
        sources.options.clone(),
    )));

    let node_stream = Arc::new(Mutex::new(NodeStreamData::new()));
    engine.add_world_updater(Arc::new(NodeWorldUpdater::new(
        node_stream.clone(),
        sources.clone(),
    )));
    engine.add_renderer(Box::new(NodeRenderer::instanced(
        node_stream.clone(),
        sources.options.clone(),
    )));
    engine.add_renderer(Box::new(NodeRenderer::array_draw(
        node_stream,
        sources.options,
    )));

    let listener = DefaultInputListener::new();
    engine.add_renderer(Box::new(SelectionOverlayRenderer::new(
        listener.selection_rectangle(),
    )));
    engine.add_input_listener(Box::new(listener));
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    #[test]
    fn first_pass_clears_then_loads() {
        let mut clear = ClearState::new([1.0; 4]);
        assert!(matches!(clear.load_op(RED), wgpu::LoadOp::Clear(_)));
        assert!(matches!(clear.load_op(RED), wgpu::LoadOp::Load));

        clear.reset();
        assert!(matches!(clear.load_op(RED), wgpu::LoadOp::Clear(_)));
    }

    #[test]
    fn empty_frame_still_owes_a_background_clear() {
        let mut clear = ClearState::new([1.0; 4]);
        clear.reset();

        let Some(wgpu::LoadOp::Clear(color)) = clear.pending_clear() else {
            panic!("frame with no passes should still clear");
        };
        assert_eq!(color, wgpu::Color::WHITE);

        // The owed clear counts as the frame's clear.
        assert!(clear.pending_clear().is_none());
        assert!(matches!(clear.load_op(RED), wgpu::LoadOp::Load));
    }

    #[test]
    fn owed_clear_uses_the_latest_background() {
        let mut clear = ClearState::new([1.0; 4]);
        clear.load_op(RED);

        clear.reset();
        let Some(wgpu::LoadOp::Clear(color)) = clear.pending_clear() else {
            panic!("expected a clear");
        };
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
    }

    #[test]
    fn drawn_frame_owes_nothing() {
        let mut clear = ClearState::new([1.0; 4]);
        clear.reset();
        clear.load_op(RED);
        assert!(clear.pending_clear().is_none());
    }
}

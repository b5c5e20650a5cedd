//! In-progress rectangle-selection overlay.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::input::SelectionRectangle;
use crate::pipeline::{
    LayerSet, PipelineElement, RenderContext, Renderer, RenderingLayer, category, order,
};

use super::{WgpuFrame, WgpuTarget};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct OverlayVertex {
    ndc: [f32; 2],
}

impl OverlayVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

const FILL_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Draws the drag rectangle published by the default input listener: a
/// translucent fill plus an outline, in screen space on the topmost layer.
pub struct SelectionOverlayRenderer {
    rectangle: SelectionRectangle,

    pipeline_format: Option<wgpu::TextureFormat>,
    fill_pipeline: Option<wgpu::RenderPipeline>,
    outline_pipeline: Option<wgpu::RenderPipeline>,
    vbo: Option<wgpu::Buffer>,
    fill_ibo: Option<wgpu::Buffer>,
}

impl SelectionOverlayRenderer {
    pub fn new(rectangle: SelectionRectangle) -> Self {
        Self {
            rectangle,
            pipeline_format: None,
            fill_pipeline: None,
            outline_pipeline: None,
            vbo: None,
            fill_ibo: None,
        }
    }

    fn ensure_pipelines(&mut self, target: &WgpuTarget) {
        let format = target.surface_format();
        if self.pipeline_format == Some(format) && self.fill_pipeline.is_some() {
            return;
        }
        let device = target.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skein overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skein overlay pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let make_pipeline = |label: &str,
                             fragment_entry: &str,
                             topology: wgpu::PrimitiveTopology| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[OverlayVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        self.fill_pipeline = Some(make_pipeline(
            "skein overlay fill pipeline",
            "fs_fill",
            wgpu::PrimitiveTopology::TriangleList,
        ));
        self.outline_pipeline = Some(make_pipeline(
            "skein overlay outline pipeline",
            "fs_outline",
            wgpu::PrimitiveTopology::LineStrip,
        ));
        self.fill_ibo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skein overlay fill ibo"),
            contents: bytemuck::cast_slice(&FILL_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
        self.vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("skein overlay vbo"),
            size: (5 * std::mem::size_of::<OverlayVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.pipeline_format = Some(format);
    }
}

impl PipelineElement for SelectionOverlayRenderer {
    fn name(&self) -> &str {
        "selection-rectangle-overlay"
    }

    fn category(&self) -> &str {
        category::SELECTION_OVERLAY
    }

    fn order(&self) -> i32 {
        order::SELECTION_OVERLAY
    }
}

impl Renderer<WgpuTarget> for SelectionOverlayRenderer {
    fn dispose(&mut self, _target: &mut WgpuTarget) {
        self.fill_pipeline = None;
        self.outline_pipeline = None;
        self.vbo = None;
        self.fill_ibo = None;
        self.pipeline_format = None;
    }

    fn layers(&self) -> LayerSet {
        LayerSet::of(&[RenderingLayer::Front4])
    }

    fn render(
        &mut self,
        target: &mut WgpuTarget,
        _layer: RenderingLayer,
        ctx: &RenderContext,
    ) -> anyhow::Result<()> {
        let Some([a, b]) = self.rectangle.get() else {
            return Ok(());
        };
        if ctx.width <= 0.0 || ctx.height <= 0.0 {
            return Ok(());
        }

        self.ensure_pipelines(target);

        // Screen pixels to NDC, Y flipped. Corner order: the four corners of
        // the drag rectangle counterclockwise, then the first repeated for
        // the line strip.
        let to_ndc = |x: f32, y: f32| OverlayVertex {
            ndc: [x / ctx.width * 2.0 - 1.0, 1.0 - y / ctx.height * 2.0],
        };
        let vertices = [
            to_ndc(a.x, a.y),
            to_ndc(b.x, a.y),
            to_ndc(b.x, b.y),
            to_ndc(a.x, b.y),
            to_ndc(a.x, a.y),
        ];
        if let Some(vbo) = self.vbo.as_ref() {
            target
                .queue()
                .write_buffer(vbo, 0, bytemuck::cast_slice(&vertices));
        }

        let load = target.color_load_op(ctx.background_color);
        let (Some(fill_pipeline), Some(outline_pipeline), Some(vbo), Some(fill_ibo)) = (
            self.fill_pipeline.as_ref(),
            self.outline_pipeline.as_ref(),
            self.vbo.as_ref(),
            self.fill_ibo.as_ref(),
        ) else {
            return Ok(());
        };
        let Some(WgpuFrame { encoder, view }) = target.frame_mut() else {
            return Ok(());
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("skein overlay pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
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

        rpass.set_pipeline(fill_pipeline);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(fill_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);

        rpass.set_pipeline(outline_pipeline);
        rpass.draw(0..5, 0..1);

        Ok(())
    }
}

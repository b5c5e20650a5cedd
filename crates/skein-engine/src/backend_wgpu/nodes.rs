//! Node pipeline elements: disc updater and renderer.

use std::sync::{Arc, Mutex, RwLock};

use crate::pipeline::{
    LayerSet, PipelineElement, RenderContext, Renderer, RenderingLayer, WorldUpdater, category,
    order,
};
use crate::settings::RenderingOptions;
use crate::stream::{
    NODE_ATTRIBS_STRIDE, NODE_BATCH_SIZE, NODE_VERTEX_COUNT, NodeStreamData, batch_ranges,
    replicate_records,
};
use crate::target::Capabilities;

use super::common::{Globals, GlobalsBinding, alpha_blend, create_globals_layout,
    ensure_record_capacity};
use super::{StreamSources, WgpuFrame, WgpuTarget};

const RECORD_BYTES: u64 = (NODE_ATTRIBS_STRIDE * std::mem::size_of::<f32>()) as u64;

/// Recomputes the node attribute stream once per update tick.
pub struct NodeWorldUpdater {
    stream: Arc<Mutex<NodeStreamData>>,
    sources: StreamSources,
}

impl NodeWorldUpdater {
    pub fn new(stream: Arc<Mutex<NodeStreamData>>, sources: StreamSources) -> Self {
        Self { stream, sources }
    }
}

impl PipelineElement for NodeWorldUpdater {
    fn name(&self) -> &str {
        "node-updater"
    }

    fn category(&self) -> &str {
        category::NODE
    }

    fn order(&self) -> i32 {
        order::NODES
    }
}

impl WorldUpdater for NodeWorldUpdater {
    fn update_world(&self) -> anyhow::Result<()> {
        let view = self.sources.camera.read().unwrap().view_boundaries();
        let selection = self.sources.selection.read().unwrap().clone();
        let options = self.sources.options.read().unwrap().clone();

        self.stream
            .lock()
            .unwrap()
            .update(self.sources.graph.as_ref(), view, &selection, &options);
        Ok(())
    }
}

/// Draws node discs from the node stream.
pub struct NodeRenderer {
    name: &'static str,
    instanced: bool,
    stream: Arc<Mutex<NodeStreamData>>,
    options: Arc<RwLock<RenderingOptions>>,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    back_globals: Option<GlobalsBinding>,
    front_globals: Option<GlobalsBinding>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
    replicated: Vec<f32>,
}

impl NodeRenderer {
    pub fn instanced(
        stream: Arc<Mutex<NodeStreamData>>,
        options: Arc<RwLock<RenderingOptions>>,
    ) -> Self {
        Self::new("node-instanced", true, stream, options)
    }

    pub fn array_draw(
        stream: Arc<Mutex<NodeStreamData>>,
        options: Arc<RwLock<RenderingOptions>>,
    ) -> Self {
        Self::new("node-array-draw", false, stream, options)
    }

    fn new(
        name: &'static str,
        instanced: bool,
        stream: Arc<Mutex<NodeStreamData>>,
        options: Arc<RwLock<RenderingOptions>>,
    ) -> Self {
        Self {
            name,
            instanced,
            stream,
            options,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            back_globals: None,
            front_globals: None,
            vbo: None,
            vbo_capacity: 0,
            replicated: Vec::new(),
        }
    }

    fn attribute_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![
            0 => Float32x4 // x, y, size, color bits
        ];
        wgpu::VertexBufferLayout {
            array_stride: RECORD_BYTES,
            step_mode: if self.instanced {
                wgpu::VertexStepMode::Instance
            } else {
                wgpu::VertexStepMode::Vertex
            },
            attributes: &ATTRS,
        }
    }

    fn ensure_pipeline(&mut self, target: &WgpuTarget) {
        let format = target.surface_format();
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }
        let device = target.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skein node shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/node.wgsl").into()),
        });

        let bind_group_layout = create_globals_layout(device, "skein node bgl");
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skein node pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skein node pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[self.attribute_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
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
        });

        self.back_globals = Some(GlobalsBinding::new(
            device,
            &bind_group_layout,
            "skein node back globals",
        ));
        self.front_globals = Some(GlobalsBinding::new(
            device,
            &bind_group_layout,
            "skein node front globals",
        ));
        self.bind_group_layout = Some(bind_group_layout);
        self.pipeline = Some(pipeline);
        self.pipeline_format = Some(format);
    }

    fn upload(&mut self, target: &WgpuTarget) {
        let stream = self.stream.lock().unwrap();
        let total = stream.counter().total_to_draw();
        if total == 0 {
            return;
        }

        if self.instanced {
            ensure_record_capacity(
                target.device(),
                &mut self.vbo,
                &mut self.vbo_capacity,
                total,
                NODE_ATTRIBS_STRIDE,
                "skein node instance vbo",
            );
            let Some(vbo) = self.vbo.as_ref() else { return };
            target
                .queue()
                .write_buffer(vbo, 0, bytemuck::cast_slice(stream.attributes().records(0..total)));
        } else {
            replicate_records(
                stream.attributes().records(0..total),
                NODE_ATTRIBS_STRIDE,
                NODE_VERTEX_COUNT,
                &mut self.replicated,
            );
            ensure_record_capacity(
                target.device(),
                &mut self.vbo,
                &mut self.vbo_capacity,
                total * NODE_VERTEX_COUNT,
                NODE_ATTRIBS_STRIDE,
                "skein node vertex vbo",
            );
            let Some(vbo) = self.vbo.as_ref() else { return };
            target
                .queue()
                .write_buffer(vbo, 0, bytemuck::cast_slice(&self.replicated));
        }
    }

    fn write_globals(&self, target: &WgpuTarget, ctx: &RenderContext, back: bool) {
        let lighten = if back {
            self.options.read().unwrap().lighten_non_selected_factor
        } else {
            0.0
        };
        let globals = Globals {
            mvp: ctx.mvp_floats,
            background: ctx.background_color,
            lighten,
            _pad: [0.0; 3],
        };
        let binding = if back { &self.back_globals } else { &self.front_globals };
        if let Some(binding) = binding {
            binding.write(target.queue(), &globals);
        }
    }
}

impl PipelineElement for NodeRenderer {
    fn name(&self) -> &str {
        self.name
    }

    fn category(&self) -> &str {
        category::NODE
    }

    fn preference_in_category(&self) -> i32 {
        if self.instanced { 50 } else { 0 }
    }

    fn order(&self) -> i32 {
        order::NODES
    }

    fn is_available(&self, capabilities: &Capabilities) -> bool {
        !self.instanced || capabilities.can_instance()
    }
}

impl Renderer<WgpuTarget> for NodeRenderer {
    fn dispose(&mut self, _target: &mut WgpuTarget) {
        self.pipeline = None;
        self.bind_group_layout = None;
        self.back_globals = None;
        self.front_globals = None;
        self.vbo = None;
        self.vbo_capacity = 0;
        self.pipeline_format = None;
    }

    fn world_updated(&mut self, target: &mut WgpuTarget) {
        self.stream.lock().unwrap().promote();
        self.upload(target);
    }

    fn layers(&self) -> LayerSet {
        LayerSet::of(&[RenderingLayer::Back2, RenderingLayer::Front2])
    }

    fn render(
        &mut self,
        target: &mut WgpuTarget,
        layer: RenderingLayer,
        ctx: &RenderContext,
    ) -> anyhow::Result<()> {
        let back = layer.is_back();
        let range = self.stream.lock().unwrap().draw_range(back);
        if range.is_empty() {
            return Ok(());
        }

        self.ensure_pipeline(target);
        self.write_globals(target, ctx, back);

        let load = target.color_load_op(ctx.background_color);
        let (Some(pipeline), Some(vbo)) = (self.pipeline.as_ref(), self.vbo.as_ref()) else {
            return Ok(());
        };
        let binding = if back { &self.back_globals } else { &self.front_globals };
        let Some(binding) = binding.as_ref() else { return Ok(()) };
        let Some(WgpuFrame { encoder, view }) = target.frame_mut() else {
            return Ok(());
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("skein node pass"),
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
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &binding.bind_group, &[]);

        for batch in batch_ranges(range.start, range.len(), NODE_BATCH_SIZE) {
            if self.instanced {
                rpass.set_vertex_buffer(0, vbo.slice(..));
                rpass.draw(
                    0..NODE_VERTEX_COUNT as u32,
                    batch.start as u32..batch.end as u32,
                );
            } else {
                let offset = batch.start as u64 * NODE_VERTEX_COUNT as u64 * RECORD_BYTES;
                rpass.set_vertex_buffer(0, vbo.slice(offset..));
                rpass.draw(0..(batch.len() * NODE_VERTEX_COUNT) as u32, 0..1);
            }
        }

        Ok(())
    }
}

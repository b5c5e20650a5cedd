//! Edge pipeline elements: the world updater computing edge records and the
//! renderer streaming them through wgpu.

use std::sync::{Arc, Mutex, RwLock};

use crate::pipeline::{
    LayerSet, PipelineElement, RenderContext, Renderer, RenderingLayer, WorldUpdater, category,
    order,
};
use crate::settings::RenderingOptions;
use crate::stream::{
    DIRECTED_EDGE_VERTEX_COUNT, EDGE_ATTRIBS_STRIDE, EDGE_BATCH_SIZE, EdgeStreamData,
    UNDIRECTED_EDGE_VERTEX_COUNT, batch_ranges, replicate_records,
};
use crate::target::Capabilities;

use super::common::{Globals, GlobalsBinding, alpha_blend, create_globals_layout,
    ensure_record_capacity};
use super::{StreamSources, WgpuFrame, WgpuTarget};

const RECORD_BYTES: u64 = (EDGE_ATTRIBS_STRIDE * std::mem::size_of::<f32>()) as u64;

/// Recomputes the edge attribute stream once per update tick.
pub struct EdgeWorldUpdater {
    stream: Arc<Mutex<EdgeStreamData>>,
    sources: StreamSources,
}

impl EdgeWorldUpdater {
    pub fn new(stream: Arc<Mutex<EdgeStreamData>>, sources: StreamSources) -> Self {
        Self { stream, sources }
    }
}

impl PipelineElement for EdgeWorldUpdater {
    fn name(&self) -> &str {
        "edge-updater"
    }

    fn category(&self) -> &str {
        category::EDGE
    }

    fn order(&self) -> i32 {
        order::EDGES
    }
}

impl WorldUpdater for EdgeWorldUpdater {
    fn update_world(&self) -> anyhow::Result<()> {
        let view = self.sources.camera.read().unwrap().view_boundaries();
        // Snapshot at tick start; mid-tick selection changes land next tick.
        let selection = self.sources.selection.read().unwrap().clone();
        let options = self.sources.options.read().unwrap().clone();

        self.stream
            .lock()
            .unwrap()
            .update(self.sources.graph.as_ref(), view, &selection, &options);
        Ok(())
    }
}

/// Draws the edge stream, either instanced (one record per edge) or with
/// CPU-replicated vertices on targets that cannot instance.
pub struct EdgeRenderer {
    name: &'static str,
    instanced: bool,
    stream: Arc<Mutex<EdgeStreamData>>,
    options: Arc<RwLock<RenderingOptions>>,

    pipeline_format: Option<wgpu::TextureFormat>,
    undirected_pipeline: Option<wgpu::RenderPipeline>,
    directed_pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    back_globals: Option<GlobalsBinding>,
    front_globals: Option<GlobalsBinding>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,

    replicated_undirected: Vec<f32>,
    replicated_directed: Vec<f32>,
}

impl EdgeRenderer {
    pub fn instanced(
        stream: Arc<Mutex<EdgeStreamData>>,
        options: Arc<RwLock<RenderingOptions>>,
    ) -> Self {
        Self::new("edge-instanced", true, stream, options)
    }

    pub fn array_draw(
        stream: Arc<Mutex<EdgeStreamData>>,
        options: Arc<RwLock<RenderingOptions>>,
    ) -> Self {
        Self::new("edge-array-draw", false, stream, options)
    }

    fn new(
        name: &'static str,
        instanced: bool,
        stream: Arc<Mutex<EdgeStreamData>>,
        options: Arc<RwLock<RenderingOptions>>,
    ) -> Self {
        Self {
            name,
            instanced,
            stream,
            options,
            pipeline_format: None,
            undirected_pipeline: None,
            directed_pipeline: None,
            bind_group_layout: None,
            back_globals: None,
            front_globals: None,
            vbo: None,
            vbo_capacity: 0,
            replicated_undirected: Vec::new(),
            replicated_directed: Vec::new(),
        }
    }

    fn attribute_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            0 => Float32x4, // source xy, target xy
            1 => Float32,   // width
            2 => Float32,   // source color bits
            3 => Float32,   // target color bits (undirected) / override (directed)
            4 => Float32    // override bits (undirected) / target size (directed)
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

    fn ensure_pipelines(&mut self, target: &WgpuTarget) {
        let format = target.surface_format();
        if self.pipeline_format == Some(format) && self.undirected_pipeline.is_some() {
            return;
        }
        let device = target.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("skein edge shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/edge.wgsl").into()),
        });

        let bind_group_layout = create_globals_layout(device, "skein edge bgl");
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skein edge pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let attribute_layout = self.attribute_layout();
        let make_pipeline = |label: &str, entry: &str| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    buffers: &[attribute_layout.clone()],
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
            })
        };

        self.undirected_pipeline = Some(make_pipeline(
            "skein undirected edge pipeline",
            "vs_undirected",
        ));
        self.directed_pipeline = Some(make_pipeline("skein directed edge pipeline", "vs_directed"));
        self.back_globals = Some(GlobalsBinding::new(
            device,
            &bind_group_layout,
            "skein edge back globals",
        ));
        self.front_globals = Some(GlobalsBinding::new(
            device,
            &bind_group_layout,
            "skein edge front globals",
        ));
        self.bind_group_layout = Some(bind_group_layout);
        self.pipeline_format = Some(format);
    }

    fn upload(&mut self, target: &WgpuTarget) {
        let stream = self.stream.lock().unwrap();
        let undirected_total = stream.undirected_counter().total_to_draw();
        let directed_total = stream.directed_counter().total_to_draw();
        let total = undirected_total + directed_total;
        if total == 0 {
            return;
        }

        if self.instanced {
            ensure_record_capacity(
                target.device(),
                &mut self.vbo,
                &mut self.vbo_capacity,
                total,
                EDGE_ATTRIBS_STRIDE,
                "skein edge instance vbo",
            );
            let Some(vbo) = self.vbo.as_ref() else { return };
            target
                .queue()
                .write_buffer(vbo, 0, bytemuck::cast_slice(stream.attributes().records(0..total)));
        } else {
            replicate_records(
                stream.attributes().records(0..undirected_total),
                EDGE_ATTRIBS_STRIDE,
                UNDIRECTED_EDGE_VERTEX_COUNT,
                &mut self.replicated_undirected,
            );
            replicate_records(
                stream.attributes().records(undirected_total..total),
                EDGE_ATTRIBS_STRIDE,
                DIRECTED_EDGE_VERTEX_COUNT,
                &mut self.replicated_directed,
            );
            let vertex_records =
                (self.replicated_undirected.len() + self.replicated_directed.len())
                    / EDGE_ATTRIBS_STRIDE;
            ensure_record_capacity(
                target.device(),
                &mut self.vbo,
                &mut self.vbo_capacity,
                vertex_records,
                EDGE_ATTRIBS_STRIDE,
                "skein edge vertex vbo",
            );
            let Some(vbo) = self.vbo.as_ref() else { return };
            let queue = target.queue();
            queue.write_buffer(vbo, 0, bytemuck::cast_slice(&self.replicated_undirected));
            queue.write_buffer(
                vbo,
                (self.replicated_undirected.len() * std::mem::size_of::<f32>()) as u64,
                bytemuck::cast_slice(&self.replicated_directed),
            );
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

impl PipelineElement for EdgeRenderer {
    fn name(&self) -> &str {
        self.name
    }

    fn category(&self) -> &str {
        category::EDGE
    }

    fn preference_in_category(&self) -> i32 {
        if self.instanced { 50 } else { 0 }
    }

    fn order(&self) -> i32 {
        order::EDGES
    }

    fn is_available(&self, capabilities: &Capabilities) -> bool {
        !self.instanced || capabilities.can_instance()
    }
}

impl Renderer<WgpuTarget> for EdgeRenderer {
    fn dispose(&mut self, _target: &mut WgpuTarget) {
        self.undirected_pipeline = None;
        self.directed_pipeline = None;
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
        LayerSet::of(&[RenderingLayer::Back1, RenderingLayer::Front1])
    }

    fn render(
        &mut self,
        target: &mut WgpuTarget,
        layer: RenderingLayer,
        ctx: &RenderContext,
    ) -> anyhow::Result<()> {
        let back = layer.is_back();
        let (undirected_range, directed_range, undirected_total) = {
            let stream = self.stream.lock().unwrap();
            (
                stream.undirected_draw_range(back),
                stream.directed_draw_range(back),
                stream.undirected_counter().total_to_draw(),
            )
        };
        if undirected_range.is_empty() && directed_range.is_empty() {
            return Ok(());
        }

        self.ensure_pipelines(target);
        self.write_globals(target, ctx, back);

        let load = target.color_load_op(ctx.background_color);
        let (Some(undirected_pipeline), Some(directed_pipeline), Some(vbo)) = (
            self.undirected_pipeline.as_ref(),
            self.directed_pipeline.as_ref(),
            self.vbo.as_ref(),
        ) else {
            return Ok(());
        };
        let binding = if back { &self.back_globals } else { &self.front_globals };
        let Some(binding) = binding.as_ref() else { return Ok(()) };
        let Some(WgpuFrame { encoder, view }) = target.frame_mut() else {
            return Ok(());
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("skein edge pass"),
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
        rpass.set_bind_group(0, &binding.bind_group, &[]);

        if !undirected_range.is_empty() {
            rpass.set_pipeline(undirected_pipeline);
            for batch in batch_ranges(
                undirected_range.start,
                undirected_range.len(),
                EDGE_BATCH_SIZE,
            ) {
                if self.instanced {
                    rpass.set_vertex_buffer(0, vbo.slice(..));
                    rpass.draw(
                        0..UNDIRECTED_EDGE_VERTEX_COUNT as u32,
                        batch.start as u32..batch.end as u32,
                    );
                } else {
                    let offset =
                        batch.start as u64 * UNDIRECTED_EDGE_VERTEX_COUNT as u64 * RECORD_BYTES;
                    rpass.set_vertex_buffer(0, vbo.slice(offset..));
                    rpass.draw(
                        0..(batch.len() * UNDIRECTED_EDGE_VERTEX_COUNT) as u32,
                        0..1,
                    );
                }
            }
        }

        if !directed_range.is_empty() {
            rpass.set_pipeline(directed_pipeline);
            for batch in batch_ranges(directed_range.start, directed_range.len(), EDGE_BATCH_SIZE) {
                if self.instanced {
                    rpass.set_vertex_buffer(0, vbo.slice(..));
                    rpass.draw(
                        0..DIRECTED_EDGE_VERTEX_COUNT as u32,
                        batch.start as u32..batch.end as u32,
                    );
                } else {
                    // Directed vertices sit after the undirected block.
                    let base = undirected_total as u64
                        * UNDIRECTED_EDGE_VERTEX_COUNT as u64
                        * RECORD_BYTES;
                    let offset = base
                        + (batch.start - undirected_total) as u64
                            * DIRECTED_EDGE_VERTEX_COUNT as u64
                            * RECORD_BYTES;
                    rpass.set_vertex_buffer(0, vbo.slice(offset..));
                    rpass.draw(0..(batch.len() * DIRECTED_EDGE_VERTEX_COUNT) as u32, 0..1);
                }
            }
        }

        Ok(())
    }
}

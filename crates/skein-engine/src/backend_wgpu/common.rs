//! Shared GPU types and helpers used by the wgpu pipeline elements.

use bytemuck::{Pod, Zeroable};

/// Per-pass uniforms. Each renderer keeps two bindings of this, one for the
/// back pass (lighten active) and one for the front pass (lighten zero).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct Globals {
    pub mvp: [f32; 16],
    pub background: [f32; 4],
    pub lighten: f32,
    pub _pad: [f32; 3],
}

pub(super) fn globals_min_binding_size() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<Globals>() as u64)
        .expect("Globals has non-zero size by construction")
}

pub(super) fn create_globals_layout(
    device: &wgpu::Device,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: Some(globals_min_binding_size()),
            },
            count: None,
        }],
    })
}

/// A uniform buffer plus its bind group.
pub(super) struct GlobalsBinding {
    ubo: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GlobalsBinding {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });
        Self { ubo, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, globals: &Globals) {
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(globals));
    }
}

pub(super) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState::ALPHA_BLENDING
}

/// Grows an instance/vertex buffer to the next power of two of `required`
/// float records of `stride` floats each, recreating (orphaning) the buffer
/// instead of stalling on an in-flight copy. Returns the new capacity in
/// records.
pub(super) fn ensure_record_capacity(
    device: &wgpu::Device,
    buffer: &mut Option<wgpu::Buffer>,
    capacity: &mut usize,
    required: usize,
    stride: usize,
    label: &str,
) {
    if required <= *capacity && buffer.is_some() {
        return;
    }
    let new_cap = required.next_power_of_two().max(64);
    let new_size = (new_cap * stride * std::mem::size_of::<f32>()) as u64;
    *buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: new_size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    }));
    *capacity = new_cap;
}

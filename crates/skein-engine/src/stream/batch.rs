use std::ops::Range;

/// Edges streamed to the GPU per upload + draw call.
pub const EDGE_BATCH_SIZE: usize = 32_768;

/// Nodes streamed to the GPU per upload + draw call.
pub const NODE_BATCH_SIZE: usize = 65_536;

/// Splits the record run `[offset, offset + count)` into bounded batches.
pub fn batch_ranges(
    offset: usize,
    count: usize,
    batch_size: usize,
) -> impl Iterator<Item = Range<usize>> {
    assert!(batch_size > 0);
    let end = offset + count;
    (offset..end)
        .step_by(batch_size)
        .map(move |start| start..(start + batch_size).min(end))
}

/// Expands each fixed-stride record into `vertex_count` consecutive copies.
///
/// Backends without instanced draws need one attribute record per on-screen
/// vertex; this is the CPU-side replication done once per batch before
/// upload.
pub fn replicate_records(src: &[f32], stride: usize, vertex_count: usize, dst: &mut Vec<f32>) {
    debug_assert_eq!(src.len() % stride, 0);
    dst.clear();
    dst.reserve(src.len() * vertex_count);
    for record in src.chunks_exact(stride) {
        for _ in 0..vertex_count {
            dst.extend_from_slice(record);
        }
    }
}

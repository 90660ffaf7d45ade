use bytemuck::{Pod, Zeroable};
use std::mem;

/// One corner of a sprite quad as the sprite shader reads it.
///
/// `tex_slot` is `0.0` for untextured quads and `1.0..=16.0` for the
/// batch's texture slots. It is a float so it can share the interleaved
/// buffer without a second vertex stream.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Default)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    pub tex_slot: f32,
}

impl SpriteVertex {
    pub const VERTICES_PER_SPRITE: usize = 4;
    pub const INDICES_PER_SPRITE: usize = 6;

    pub const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4,
        2 => Float32x2,
        3 => Float32
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Largest batch whose vertex buffer fits in `max_buffer_size` bytes and
/// whose vertex indices fit in a `u32`.
pub fn max_sprites_per_buffer(max_buffer_size: u64) -> usize {
    let bytes_per_sprite = (mem::size_of::<SpriteVertex>() * SpriteVertex::VERTICES_PER_SPRITE) as u64;
    let by_size = max_buffer_size / bytes_per_sprite;
    let by_index = u32::MAX as u64 / SpriteVertex::VERTICES_PER_SPRITE as u64;
    by_size.min(by_index) as usize
}

/// Index pattern for `sprite_count` quads: each quad's corners are
/// top-right, bottom-right, bottom-left, top-left and become triangles
/// (0, 1, 3) and (1, 2, 3).
pub fn quad_indices(sprite_count: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(sprite_count * SpriteVertex::INDICES_PER_SPRITE);
    for sprite in 0..sprite_count {
        let base = (sprite * SpriteVertex::VERTICES_PER_SPRITE) as u32;
        indices.extend_from_slice(&[base, base + 1, base + 3, base + 1, base + 2, base + 3]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_limit_respects_buffer_size_and_index_range() {
        let per_sprite = (std::mem::size_of::<SpriteVertex>() * 4) as u64;
        assert_eq!(max_sprites_per_buffer(per_sprite * 10), 10);
        assert_eq!(max_sprites_per_buffer(per_sprite * 10 + 1), 10);
        assert_eq!(max_sprites_per_buffer(u64::MAX), (u32::MAX / 4) as usize);
    }

    #[test]
    fn vertex_stride_matches_struct_size() {
        assert_eq!(
            SpriteVertex::layout().array_stride,
            std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress
        );
        // 3 + 4 + 2 + 1 floats
        assert_eq!(std::mem::size_of::<SpriteVertex>(), 40);
    }

    #[test]
    fn quad_indices_reference_own_vertices() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 3, 1, 2, 3, 4, 5, 7, 5, 6, 7]);
    }
}

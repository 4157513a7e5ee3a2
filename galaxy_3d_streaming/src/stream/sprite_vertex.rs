/// Sprite vertex format streamed by the sprite batch

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::device::{BufferFormat, VertexAttributeDesc, VertexLayout};
use crate::error::Result;

/// Position, texture coordinate and packed RGBA color (20 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: Vec2,
    pub uv: Vec2,
    pub color: [u8; 4],
}

impl SpriteVertex {
    pub fn new(position: Vec2, uv: Vec2, color: [u8; 4]) -> Self {
        Self { position, uv, color }
    }

    /// Layout matching the struct field order
    pub fn layout() -> Result<VertexLayout> {
        VertexLayout::new(vec![
            VertexAttributeDesc::new("position", BufferFormat::R32G32_SFLOAT),
            VertexAttributeDesc::new("uv", BufferFormat::R32G32_SFLOAT),
            VertexAttributeDesc::new("color", BufferFormat::R8G8B8A8_UNORM),
        ])
    }

    /// Four corners of an axis-aligned quad, counter-clockwise from `min`
    ///
    /// The order matches `IndexBufferDesc::quad_list`: triangles `0,1,2` and
    /// `2,3,0` split the quad along its `min`-`max` diagonal. Stream quads as
    /// a triangle list through that pattern (see `StreamerConfig::quads`), so
    /// any number of them fit in one render.
    pub fn quad(min: Vec2, max: Vec2, uv_min: Vec2, uv_max: Vec2, color: [u8; 4]) -> [SpriteVertex; 4] {
        [
            Self::new(min, uv_min, color),
            Self::new(Vec2::new(max.x, min.y), Vec2::new(uv_max.x, uv_min.y), color),
            Self::new(max, uv_max, color),
            Self::new(Vec2::new(min.x, max.y), Vec2::new(uv_min.x, uv_max.y), color),
        ]
    }
}

#[cfg(test)]
#[path = "sprite_vertex_tests.rs"]
mod tests;

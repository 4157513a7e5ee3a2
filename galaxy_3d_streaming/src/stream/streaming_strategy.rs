/// StreamingStrategy trait - the contract shared by every streamer

use bytemuck::Pod;

use crate::device::{PrimitiveTopology, ProgramId, VertexLayout};
use crate::error::{Error, Result};
use crate::stream::StreamerConfig;

/// Diagnostic counters of a streamer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Regions thrown away: every respecify upload, every ring growth
    pub discarded_region_count: u64,
    /// Renders that had to block on the GPU
    pub stall_count: u64,
    /// Current device buffer capacity in bytes (0 without a device buffer)
    pub capacity_bytes: u64,
}

/// Buffer-streaming strategy
///
/// A strategy is either unbound or bound to exactly one program. `render` is
/// only valid while bound, and draws reach the device in call order.
pub trait StreamingStrategy {
    /// Bind to a shader program
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` if already bound.
    fn bind(&mut self, program: ProgramId) -> Result<()>;

    /// Unbind from the current program
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` if not bound.
    fn unbind(&mut self) -> Result<()>;

    /// Stream `used_count` primitives from `data` and draw `emit_count` elements
    ///
    /// `data` holds tightly packed vertices in the strategy's layout, one
    /// primitive every `vertices_per_primitive` vertices, and may contain more
    /// than `used_count` primitives. `emit_count` counts indices on an indexed
    /// stream (6 per quad with the quad index buffer) and vertices otherwise.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` when unbound, `Error::Assertion` when `data`
    /// holds fewer than `used_count` primitives or `emit_count` is not
    /// `used_count` times the elements of one primitive. Nothing reaches the
    /// device on error.
    fn render(
        &mut self,
        topology: PrimitiveTopology,
        data: &[u8],
        used_count: u32,
        emit_count: u32,
    ) -> Result<()>;

    /// Submit pending work to the device
    fn flush(&mut self) -> Result<()>;

    /// Layout every render's vertices must follow
    fn vertex_layout(&self) -> &VertexLayout;

    /// Counter snapshot
    fn stats(&self) -> StreamStats;

    fn discarded_region_count(&self) -> u64 {
        self.stats().discarded_region_count
    }

    fn stall_count(&self) -> u64 {
        self.stats().stall_count
    }

    /// Typed variant of `render` for `Pod` vertex structs
    ///
    /// # Errors
    ///
    /// `Error::Assertion` if `size_of::<V>()` differs from the layout stride.
    fn render_vertices<V: Pod>(
        &mut self,
        topology: PrimitiveTopology,
        vertices: &[V],
        used_count: u32,
        emit_count: u32,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let stride = self.vertex_layout().stride() as usize;
        if std::mem::size_of::<V>() != stride {
            return Err(Error::Assertion(format!(
                "vertex type is {} bytes but the layout stride is {}",
                std::mem::size_of::<V>(),
                stride
            ))
            .logged("galaxy3d::StreamingStrategy"));
        }
        self.render(topology, bytemuck::cast_slice(vertices), used_count, emit_count)
    }
}

/// Vertices and draw elements making up one primitive of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveShape {
    pub vertices_per_primitive: u32,
    /// Set when draws go through an index buffer
    pub indices_per_primitive: Option<u32>,
}

impl PrimitiveShape {
    pub(crate) fn from_config(config: &StreamerConfig) -> Self {
        Self {
            vertices_per_primitive: config.vertices_per_primitive,
            indices_per_primitive: config.index_buffer.as_ref().map(|index| index.indices_per_primitive),
        }
    }

    /// Elements one primitive emits: its indices, or its vertices when not indexed
    pub fn elements_per_primitive(&self) -> u32 {
        self.indices_per_primitive.unwrap_or(self.vertices_per_primitive)
    }

    pub fn vertex_count(&self, primitives: u32) -> u64 {
        primitives as u64 * self.vertices_per_primitive as u64
    }

    pub fn primitive_stride(&self, vertex_stride: u32) -> u64 {
        self.vertices_per_primitive as u64 * vertex_stride as u64
    }
}

/// Validate the counts shared by every strategy
///
/// Returns `Ok(false)` for the empty render (nothing used, nothing emitted).
pub(crate) fn check_render_counts(
    source: &str,
    data: &[u8],
    vertex_stride: u32,
    shape: PrimitiveShape,
    used_count: u32,
    emit_count: u32,
) -> Result<bool> {
    if used_count == 0 {
        if emit_count == 0 {
            return Ok(false);
        }
        return Err(Error::Assertion(format!("{} elements emitted from zero primitives", emit_count)).logged(source));
    }
    let available = data.len() as u64 / shape.primitive_stride(vertex_stride).max(1);
    if used_count as u64 > available {
        return Err(Error::Assertion(format!(
            "{} primitives used but only {} supplied",
            used_count, available
        ))
        .logged(source));
    }
    if emit_count % used_count != 0 {
        return Err(Error::Assertion(format!(
            "emit count {} is not a multiple of used count {}",
            emit_count, used_count
        ))
        .logged(source));
    }
    let per = shape.elements_per_primitive();
    if emit_count / used_count != per {
        return Err(Error::Assertion(format!(
            "{} primitives emit {} elements, not {}",
            used_count,
            used_count as u64 * per as u64,
            emit_count
        ))
        .logged(source));
    }
    Ok(true)
}

#[cfg(test)]
#[path = "streaming_strategy_tests.rs"]
mod tests;

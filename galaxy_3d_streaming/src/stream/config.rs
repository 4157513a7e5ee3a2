/// Streamer configuration

use crate::device::IndexType;
use crate::stream::StrategyKind;

/// Default vertex capacity of a freshly created stream
pub const DEFAULT_CAPACITY_VERTICES: u32 = 4096;

/// Default growth ceiling (8 MiB)
pub const DEFAULT_GROWTH_CEILING_BYTES: u64 = 8 * 1024 * 1024;

/// Immutable index buffer uploaded once at stream creation
///
/// The pattern repeats every `indices_per_primitive` indices, each repetition
/// addressing the next primitive's vertices, so a draw starting at primitive
/// `n` reads indices from `n * indices_per_primitive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBufferDesc {
    /// Index element width
    pub index_type: IndexType,
    /// Index values (stored at `index_type` width on the device)
    pub indices: Vec<u32>,
    /// Indices emitted for each primitive
    pub indices_per_primitive: u32,
}

impl IndexBufferDesc {
    pub fn new(index_type: IndexType, indices: Vec<u32>, indices_per_primitive: u32) -> Self {
        Self { index_type, indices, indices_per_primitive }
    }

    /// Quad list indices: `0,1,2, 2,3,0` for each of `quad_count` quads
    pub fn quad_list(index_type: IndexType, quad_count: u32) -> Self {
        let mut indices = Vec::with_capacity(quad_count as usize * 6);
        for quad in 0..quad_count {
            let base = quad * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        Self { index_type, indices, indices_per_primitive: 6 }
    }

    /// Number of whole primitives the pattern covers
    pub fn primitive_count(&self) -> u32 {
        match self.indices_per_primitive {
            0 => 0,
            per => self.indices.len() as u32 / per,
        }
    }

    /// Number of indices
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether there are no indices
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Largest index value, if any
    pub fn max_index(&self) -> Option<u32> {
        self.indices.iter().copied().max()
    }

    /// Device representation at the configured width
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.index_type {
            IndexType::U16 => {
                let narrow: Vec<u16> = self.indices.iter().map(|&i| i as u16).collect();
                bytemuck::cast_slice::<u16, u8>(&narrow).to_vec()
            }
            IndexType::U32 => bytemuck::cast_slice::<u32, u8>(&self.indices).to_vec(),
        }
    }
}

/// Streamer configuration
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Initial device buffer capacity, in vertices
    pub initial_capacity_vertices: u32,
    /// Vertices making up one primitive; `render` counts primitives
    pub vertices_per_primitive: u32,
    /// Growth stops once the buffer reaches this many bytes
    pub growth_ceiling_bytes: u64,
    /// Optional immutable index buffer (disables growth)
    pub index_buffer: Option<IndexBufferDesc>,
    /// Pin a strategy instead of taking the best supported one
    pub forced_strategy: Option<StrategyKind>,
    /// Name used in log messages
    pub label: String,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            initial_capacity_vertices: DEFAULT_CAPACITY_VERTICES,
            vertices_per_primitive: 1,
            growth_ceiling_bytes: DEFAULT_GROWTH_CEILING_BYTES,
            index_buffer: None,
            forced_strategy: None,
            label: "sprite stream".to_string(),
        }
    }
}

impl StreamerConfig {
    /// Sprite configuration: 4-vertex quads drawn through a quad index
    /// buffer sized for `max_quads`
    pub fn quads(max_quads: u32, index_type: IndexType) -> Self {
        Self {
            initial_capacity_vertices: max_quads * 4,
            vertices_per_primitive: 4,
            index_buffer: Some(IndexBufferDesc::quad_list(index_type, max_quads)),
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

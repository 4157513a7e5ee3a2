/// Persistently mapped ring buffer streamer
///
/// The vertex buffer stays mapped for its whole lifetime. Renders append whole
/// primitives at `write_offset`; when a render does not fit in the remaining
/// tail the cursors wrap to 0 and the tail is abandoned. `draw_offset` moves
/// by the emitted elements, so after `n` primitives it sits on primitive `n`
/// of the index pattern (or on vertex `n * vertices_per_primitive`). Each draw locks the range it
/// reads with a fence, and a write into a range whose fence is still pending
/// blocks until the GPU is done with it. A render that had to block grows the
/// buffer by 1.75x (unless an index buffer pins the capacity, or the ceiling
/// is reached) so the next frames stall less.

use crate::device::{
    lock_device, BufferFlags, CapabilityRequirement, DeviceCapabilities, GraphicsDevice,
    PrimitiveTopology, ProgramId, SharedDevice, VertexLayout,
};
use crate::error::{Error, Result};
use crate::stream::attribute_binding::AttributeBindingBase;
use crate::stream::completion::{CompletionTracker, StreamingRegion};
use crate::stream::streaming_strategy::check_render_counts;
use crate::stream::{StreamStats, StreamerConfig, StreamingStrategy};
use crate::{engine_debug, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "galaxy3d::RingMappedStreamer";

/// Persistent mapping plus fence objects
pub const RING_MAPPED_REQUIREMENTS: [CapabilityRequirement; 2] = [
    CapabilityRequirement::new(4, 4, Some("GL_ARB_buffer_storage")),
    CapabilityRequirement::new(3, 2, Some("GL_ARB_sync")),
];

/// Capacity after one growth step, `ceil(current * 1.75)`, repeated until
/// `min_vertices` fit and capped at the ceiling
///
/// Returns `None` when the buffer cannot grow (already at or above the
/// ceiling, or the capped result would not hold `min_vertices`).
pub fn next_capacity(current_vertices: u32, stride: u32, ceiling_bytes: u64, min_vertices: u32) -> Option<u32> {
    let stride = stride.max(1) as u64;
    let current = current_vertices as u64;
    if current * stride >= ceiling_bytes {
        return None;
    }
    let ceiling_vertices = (ceiling_bytes / stride).min(u32::MAX as u64);

    let mut target = current.max(1);
    loop {
        target = (target * 7 + 3) / 4;
        if target >= min_vertices as u64 || target >= ceiling_vertices {
            break;
        }
    }
    let target = target.min(ceiling_vertices);
    if target <= current || target < min_vertices as u64 {
        return None;
    }
    Some(target as u32)
}

pub struct RingMappedStreamer {
    base: AttributeBindingBase,
    tracker: CompletionTracker,
    /// Next byte offset to write
    write_offset: u64,
    /// Next element (vertex or index) a draw starts from, in step with
    /// `write_offset`
    draw_offset: u32,
    growth_ceiling_bytes: u64,
    discarded_region_count: u64,
    stall_count: u64,
}

impl RingMappedStreamer {
    /// Whether the device can run this strategy
    pub fn is_supported(capabilities: &DeviceCapabilities) -> bool {
        crate::device::requirements_met(&RING_MAPPED_REQUIREMENTS, capabilities)
    }

    /// Create the mapped ring buffer (and index buffer, if configured)
    pub fn new(device: SharedDevice, vertex_layout: VertexLayout, config: &StreamerConfig) -> Result<Self> {
        let base = AttributeBindingBase::new(device, vertex_layout, config, BufferFlags::persistent_write())?;
        engine_info!(
            SOURCE,
            "[{}] ring buffer created: {} vertices ({} bytes){}",
            base.label(),
            base.capacity_vertices(),
            base.capacity_bytes(),
            if base.has_index_buffer() { ", indexed" } else { "" }
        );
        Ok(Self {
            base,
            tracker: CompletionTracker::new(),
            write_offset: 0,
            draw_offset: 0,
            growth_ceiling_bytes: config.growth_ceiling_bytes,
            discarded_region_count: 0,
            stall_count: 0,
        })
    }

    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    pub fn draw_offset(&self) -> u32 {
        self.draw_offset
    }

    pub fn capacity_vertices(&self) -> u32 {
        self.base.capacity_vertices()
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.base.capacity_bytes()
    }

    /// Number of regions still guarded by a fence
    pub fn live_region_count(&self) -> usize {
        self.tracker.len()
    }

    pub fn attribute_binding(&self) -> &AttributeBindingBase {
        &self.base
    }

    /// Grow after contention (or to fit an oversized render)
    ///
    /// Skipped without error when an index buffer pins the capacity or the
    /// ceiling is reached. Returns whether the buffer was replaced.
    fn grow(&mut self, device: &mut dyn GraphicsDevice, min_vertices: u32) -> Result<bool> {
        if self.base.has_index_buffer() {
            engine_debug!(SOURCE, "[{}] growth skipped: index buffer fixes the capacity", self.base.label());
            return Ok(false);
        }
        let current = self.base.capacity_vertices();
        let stride = self.base.vertex_layout().stride();
        let Some(new_capacity) = next_capacity(current, stride, self.growth_ceiling_bytes, min_vertices) else {
            engine_warn!(
                SOURCE,
                "[{}] growth skipped: {} bytes reached the {} byte ceiling",
                self.base.label(),
                self.base.capacity_bytes(),
                self.growth_ceiling_bytes
            );
            return Ok(false);
        };

        // Every region on the old buffer must be consumed before it goes away
        self.tracker.wait_for_all(device)?;
        self.base.replace_vertex_buffer(device, new_capacity)?;

        self.write_offset = 0;
        self.draw_offset = 0;
        self.discarded_region_count += 1;
        engine_debug!(
            SOURCE,
            "[{}] ring buffer grown: {} -> {} vertices",
            self.base.label(),
            current,
            new_capacity
        );
        Ok(true)
    }

    /// Reject a render that cannot fit before anything reaches the device
    fn validate_size(&self, used_count: u32, size_bytes: u64) -> Result<()> {
        if size_bytes <= self.base.capacity_bytes() {
            return Ok(());
        }
        let growable = !self.base.has_index_buffer()
            && u32::try_from(self.base.shape().vertex_count(used_count))
                .ok()
                .and_then(|vertices| {
                    next_capacity(
                        self.base.capacity_vertices(),
                        self.base.vertex_layout().stride(),
                        self.growth_ceiling_bytes,
                        vertices,
                    )
                })
                .is_some();
        if growable {
            return Ok(());
        }
        Err(Error::Assertion(format!(
            "render of {} primitives ({} bytes) exceeds the {}-vertex stream",
            used_count,
            size_bytes,
            self.base.capacity_vertices()
        ))
        .logged(SOURCE))
    }
}

impl StreamingStrategy for RingMappedStreamer {
    fn bind(&mut self, program: ProgramId) -> Result<()> {
        self.base.bind(program)
    }

    fn unbind(&mut self) -> Result<()> {
        self.base.unbind()
    }

    fn render(
        &mut self,
        topology: PrimitiveTopology,
        data: &[u8],
        used_count: u32,
        emit_count: u32,
    ) -> Result<()> {
        if !self.base.is_bound() {
            return Err(Error::InvalidState("render while not bound".to_string()).logged(SOURCE));
        }
        let stride = self.base.vertex_layout().stride();
        let shape = self.base.shape();
        if !check_render_counts(SOURCE, data, stride, shape, used_count, emit_count)? {
            return Ok(());
        }
        let size_bytes = used_count as u64 * shape.primitive_stride(stride);
        self.validate_size(used_count, size_bytes)?;

        let device = self.base.device().clone();
        let mut guard = lock_device(&device, SOURCE)?;

        if size_bytes > self.base.capacity_bytes() {
            self.grow(&mut *guard, shape.vertex_count(used_count) as u32)?;
        }

        if self.write_offset + size_bytes > self.base.capacity_bytes() {
            engine_trace!(SOURCE, "[{}] wrap at byte {}", self.base.label(), self.write_offset);
            self.write_offset = 0;
            self.draw_offset = 0;
        }

        let region = StreamingRegion::new(self.write_offset, size_bytes);
        if self.tracker.wait_for_range(&mut *guard, region)? {
            self.stall_count += 1;
            engine_trace!(
                SOURCE,
                "[{}] stalled on [{}, {})",
                self.base.label(),
                region.offset_bytes,
                region.end()
            );
            self.grow(&mut *guard, 0)?;
        }

        // Growth may have moved the cursors back to the start of a new buffer
        let region = StreamingRegion::new(self.write_offset, size_bytes);
        guard.write_buffer(self.base.vertex_buffer(), region.offset_bytes, &data[..size_bytes as usize])?;

        match self.base.index_type() {
            Some(index_type) => guard.draw_indexed(topology, index_type, self.draw_offset, emit_count)?,
            None => guard.draw(topology, self.draw_offset, emit_count)?,
        }

        self.tracker.lock_range(&mut *guard, region)?;
        self.write_offset += size_bytes;
        self.draw_offset += emit_count;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        lock_device(self.base.device(), SOURCE)?.flush()
    }

    fn vertex_layout(&self) -> &VertexLayout {
        self.base.vertex_layout()
    }

    fn stats(&self) -> StreamStats {
        StreamStats {
            discarded_region_count: self.discarded_region_count,
            stall_count: self.stall_count,
            capacity_bytes: self.base.capacity_bytes(),
        }
    }
}

impl Drop for RingMappedStreamer {
    fn drop(&mut self) {
        let device = self.base.device().clone();
        let mut guard = match device.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.tracker.release_all(&mut *guard);
    }
}

#[cfg(test)]
#[path = "ring_mapped_tests.rs"]
mod tests;

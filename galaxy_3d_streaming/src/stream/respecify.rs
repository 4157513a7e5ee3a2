/// Buffer respecification streamer
///
/// Every render hands the driver a fresh allocation holding exactly the used
/// primitives' vertices (orphaning the previous storage), then draws from offset 0. The
/// driver keeps the old storage alive until pending draws are done with it,
/// so the CPU never waits.

use crate::device::{
    lock_device, BufferFlags, CapabilityRequirement, DeviceCapabilities, PrimitiveTopology,
    ProgramId, SharedDevice, VertexLayout,
};
use crate::error::{Error, Result};
use crate::stream::attribute_binding::AttributeBindingBase;
use crate::stream::streaming_strategy::check_render_counts;
use crate::stream::{StreamStats, StreamerConfig, StreamingStrategy};

const SOURCE: &str = "galaxy3d::RespecifyStreamer";

/// Buffer objects plus vertex array objects
pub const RESPECIFY_REQUIREMENTS: [CapabilityRequirement; 2] = [
    CapabilityRequirement::new(1, 5, Some("GL_ARB_vertex_buffer_object")),
    CapabilityRequirement::new(3, 0, Some("GL_ARB_vertex_array_object")),
];

pub struct RespecifyStreamer {
    base: AttributeBindingBase,
    discarded_region_count: u64,
}

impl RespecifyStreamer {
    /// Whether the device can run this strategy
    pub fn is_supported(capabilities: &DeviceCapabilities) -> bool {
        crate::device::requirements_met(&RESPECIFY_REQUIREMENTS, capabilities)
    }

    pub fn new(device: SharedDevice, vertex_layout: VertexLayout, config: &StreamerConfig) -> Result<Self> {
        let base = AttributeBindingBase::new(device, vertex_layout, config, BufferFlags::DYNAMIC_STORAGE)?;
        crate::engine_info!(
            SOURCE,
            "[{}] respecified stream created: {} vertices",
            base.label(),
            base.capacity_vertices()
        );
        Ok(Self { base, discarded_region_count: 0 })
    }

    pub fn attribute_binding(&self) -> &AttributeBindingBase {
        &self.base
    }
}

impl StreamingStrategy for RespecifyStreamer {
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

        // Every render uploads from vertex 0, so the index pattern is read
        // from its start and must hold the whole batch
        let vertex_count = shape.vertex_count(used_count);
        if let Some(index_count) = self.base.index_count() {
            if vertex_count > self.base.capacity_vertices() as u64 || emit_count > index_count {
                return Err(Error::Assertion(format!(
                    "{} primitives exceed the indexed stream ({} vertices, {} indices)",
                    used_count,
                    self.base.capacity_vertices(),
                    index_count
                ))
                .logged(SOURCE));
            }
        }

        let size_bytes = (vertex_count * stride as u64) as usize;
        let mut device = lock_device(self.base.device(), SOURCE)?;
        device.respecify_buffer(self.base.vertex_buffer(), &data[..size_bytes])?;
        match self.base.index_type() {
            Some(index_type) => device.draw_indexed(topology, index_type, 0, emit_count)?,
            None => device.draw(topology, 0, emit_count)?,
        }
        self.discarded_region_count += 1;
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
            stall_count: 0,
            capacity_bytes: self.base.capacity_bytes(),
        }
    }
}

#[cfg(test)]
#[path = "respecify_tests.rs"]
mod tests;

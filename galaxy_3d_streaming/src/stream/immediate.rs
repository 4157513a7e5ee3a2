/// Immediate-mode fallback streamer
///
/// No device buffer at all: every emitted vertex is submitted one by one
/// inside a begin/end pair. A configured index buffer is kept on the CPU and
/// used to expand the vertices in index order. Like a respecified buffer,
/// `data` always sits at vertex 0, so the pattern is read from its start.

use crate::device::{
    lock_device, CapabilityRequirement, DeviceCapabilities, PrimitiveTopology, ProgramId,
    SharedDevice, VertexLayout,
};
use crate::error::{Error, Result};
use crate::stream::streaming_strategy::{check_render_counts, PrimitiveShape};
use crate::stream::{StreamStats, StreamerConfig, StreamingStrategy};

const SOURCE: &str = "galaxy3d::ImmediateFallbackStreamer";

/// Baseline feature level
pub const IMMEDIATE_REQUIREMENTS: [CapabilityRequirement; 1] = [CapabilityRequirement::new(1, 1, None)];

pub struct ImmediateFallbackStreamer {
    device: SharedDevice,
    vertex_layout: VertexLayout,
    label: String,
    shape: PrimitiveShape,
    /// CPU copy of the index pattern
    indices: Option<Vec<u32>>,
    bound_program: Option<ProgramId>,
}

impl ImmediateFallbackStreamer {
    /// Whether the device can run this strategy
    pub fn is_supported(capabilities: &DeviceCapabilities) -> bool {
        crate::device::requirements_met(&IMMEDIATE_REQUIREMENTS, capabilities)
    }

    pub fn new(device: SharedDevice, vertex_layout: VertexLayout, config: &StreamerConfig) -> Result<Self> {
        if vertex_layout.is_empty() {
            return Err(Error::Configuration("vertex layout has no attributes".to_string()).logged(SOURCE));
        }
        if config.vertices_per_primitive == 0 {
            return Err(Error::Configuration("primitives need at least one vertex".to_string()).logged(SOURCE));
        }
        let indices = match &config.index_buffer {
            Some(desc) if desc.is_empty() => {
                return Err(Error::Configuration("index buffer has no indices".to_string()).logged(SOURCE));
            }
            Some(desc) if desc.indices_per_primitive == 0 || desc.len() % desc.indices_per_primitive as usize != 0 => {
                return Err(Error::Configuration(format!(
                    "{} indices do not split into primitives of {}",
                    desc.len(),
                    desc.indices_per_primitive
                ))
                .logged(SOURCE));
            }
            Some(desc) => Some(desc.indices.clone()),
            None => None,
        };
        crate::engine_info!(SOURCE, "[{}] immediate-mode stream created", config.label);
        Ok(Self {
            device,
            vertex_layout,
            label: config.label.clone(),
            shape: PrimitiveShape::from_config(config),
            indices,
            bound_program: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_bound(&self) -> bool {
        self.bound_program.is_some()
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.bound_program
    }

    pub fn shape(&self) -> PrimitiveShape {
        self.shape
    }

    /// Vertex indices (relative to `data`) in submission order
    ///
    /// Counts were already checked against the shape.
    fn expansion(&self, used_count: u32, emit_count: u32) -> Result<Vec<u32>> {
        let vertex_count = self.shape.vertex_count(used_count);
        let Some(indices) = &self.indices else {
            return Ok((0..vertex_count as u32).collect());
        };

        if emit_count as usize > indices.len() {
            return Err(Error::Assertion(format!(
                "{} indices requested but the pattern holds {}",
                emit_count,
                indices.len()
            ))
            .logged(SOURCE));
        }
        let pattern = &indices[..emit_count as usize];
        if let Some(&bad) = pattern.iter().find(|&&index| index as u64 >= vertex_count) {
            return Err(Error::Assertion(format!(
                "index {} references past the {} supplied vertices",
                bad, vertex_count
            ))
            .logged(SOURCE));
        }
        Ok(pattern.to_vec())
    }
}

impl StreamingStrategy for ImmediateFallbackStreamer {
    fn bind(&mut self, program: ProgramId) -> Result<()> {
        if self.bound_program.is_some() {
            return Err(Error::InvalidState("already bound".to_string()).logged(SOURCE));
        }
        let mut device = lock_device(&self.device, SOURCE)?;
        for attribute in self.vertex_layout.attributes() {
            device.set_attribute_enabled(program, attribute, true)?;
        }
        self.bound_program = Some(program);
        Ok(())
    }

    fn unbind(&mut self) -> Result<()> {
        let Some(program) = self.bound_program else {
            return Err(Error::InvalidState("not bound".to_string()).logged(SOURCE));
        };
        let mut device = lock_device(&self.device, SOURCE)?;
        for attribute in self.vertex_layout.attributes() {
            device.set_attribute_enabled(program, attribute, false)?;
        }
        self.bound_program = None;
        Ok(())
    }

    fn render(
        &mut self,
        topology: PrimitiveTopology,
        data: &[u8],
        used_count: u32,
        emit_count: u32,
    ) -> Result<()> {
        if self.bound_program.is_none() {
            return Err(Error::InvalidState("render while not bound".to_string()).logged(SOURCE));
        }
        let stride = self.vertex_layout.stride() as usize;
        if !check_render_counts(SOURCE, data, stride as u32, self.shape, used_count, emit_count)? {
            return Ok(());
        }
        let order = self.expansion(used_count, emit_count)?;

        let mut device = lock_device(&self.device, SOURCE)?;
        device.begin_immediate(topology)?;
        for index in order {
            let start = index as usize * stride;
            device.immediate_vertex(&self.vertex_layout, &data[start..start + stride])?;
        }
        device.end_immediate()
    }

    fn flush(&mut self) -> Result<()> {
        lock_device(&self.device, SOURCE)?.flush()
    }

    fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    fn stats(&self) -> StreamStats {
        StreamStats::default()
    }
}

impl Drop for ImmediateFallbackStreamer {
    fn drop(&mut self) {
        if self.bound_program.is_some() {
            self.unbind().ok();
        }
    }
}

#[cfg(test)]
#[path = "immediate_tests.rs"]
mod tests;

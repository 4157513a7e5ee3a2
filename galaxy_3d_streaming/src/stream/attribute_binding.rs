/// Shared base for strategies that draw through a cached input layout
///
/// Owns the streaming vertex buffer, the optional immutable index buffer and
/// a one-entry input layout cache keyed by shader program. The cache is only
/// rebuilt when a different program is bound, or after the vertex buffer it
/// referenced was replaced.

use crate::device::{
    lock_device, BufferDesc, BufferFlags, BufferId, BufferUsage, GraphicsDevice, IndexType,
    InputLayoutDesc, InputLayoutId, ProgramId, SharedDevice, VertexLayout,
};
use crate::error::{Error, Result};
use crate::stream::{PrimitiveShape, StreamerConfig};

const SOURCE: &str = "galaxy3d::AttributeBinding";

/// Index buffer uploaded once at creation
#[derive(Debug, Clone, Copy)]
struct IndexBufferState {
    buffer: BufferId,
    index_type: IndexType,
    index_count: u32,
}

/// Input layout built for one program
#[derive(Debug, Clone, Copy)]
struct LayoutCache {
    program: ProgramId,
    layout: InputLayoutId,
}

pub struct AttributeBindingBase {
    device: SharedDevice,
    vertex_layout: VertexLayout,
    label: String,
    vertex_buffer: BufferId,
    buffer_flags: BufferFlags,
    capacity_vertices: u32,
    shape: PrimitiveShape,
    index_buffer: Option<IndexBufferState>,
    layout_cache: Option<LayoutCache>,
    bound_program: Option<ProgramId>,
}

impl AttributeBindingBase {
    /// Validate the configuration and create the device buffers
    ///
    /// # Errors
    ///
    /// `Error::Configuration` for an empty layout, a zero capacity or
    /// primitive size, an empty or ragged index buffer, an index buffer
    /// covering fewer primitives than the stream holds, or a capacity/index
    /// the index width cannot address.
    pub fn new(
        device: SharedDevice,
        vertex_layout: VertexLayout,
        config: &StreamerConfig,
        buffer_flags: BufferFlags,
    ) -> Result<Self> {
        Self::validate(&vertex_layout, config)?;

        let capacity_vertices = config.initial_capacity_vertices;
        let mut guard = lock_device(&device, SOURCE)?;
        let vertex_buffer = guard.create_buffer(
            &BufferDesc {
                size: capacity_vertices as u64 * vertex_layout.stride() as u64,
                usage: BufferUsage::Vertex,
                flags: buffer_flags,
            },
            None,
        )?;

        let index_buffer = match &config.index_buffer {
            Some(desc) => {
                let bytes = desc.to_bytes();
                let created = guard.create_buffer(
                    &BufferDesc {
                        size: bytes.len() as u64,
                        usage: BufferUsage::Index,
                        flags: BufferFlags::empty(),
                    },
                    Some(&bytes),
                );
                match created {
                    Ok(buffer) => Some(IndexBufferState {
                        buffer,
                        index_type: desc.index_type,
                        index_count: desc.len() as u32,
                    }),
                    Err(err) => {
                        guard.destroy_buffer(vertex_buffer);
                        return Err(err.logged(SOURCE));
                    }
                }
            }
            None => None,
        };
        drop(guard);

        Ok(Self {
            device,
            vertex_layout,
            label: config.label.clone(),
            vertex_buffer,
            buffer_flags,
            capacity_vertices,
            shape: PrimitiveShape::from_config(config),
            index_buffer,
            layout_cache: None,
            bound_program: None,
        })
    }

    fn validate(vertex_layout: &VertexLayout, config: &StreamerConfig) -> Result<()> {
        if vertex_layout.is_empty() {
            return Err(Error::Configuration("vertex layout has no attributes".to_string()).logged(SOURCE));
        }
        if config.initial_capacity_vertices == 0 {
            return Err(Error::Configuration("stream capacity must be at least one vertex".to_string()).logged(SOURCE));
        }
        if config.vertices_per_primitive == 0 {
            return Err(Error::Configuration("primitives need at least one vertex".to_string()).logged(SOURCE));
        }
        let Some(index) = &config.index_buffer else {
            return Ok(());
        };
        if index.is_empty() {
            return Err(Error::Configuration("index buffer has no indices".to_string()).logged(SOURCE));
        }
        if index.indices_per_primitive == 0 || index.len() % index.indices_per_primitive as usize != 0 {
            return Err(Error::Configuration(format!(
                "{} indices do not split into primitives of {}",
                index.len(),
                index.indices_per_primitive
            ))
            .logged(SOURCE));
        }
        let stream_primitives = config.initial_capacity_vertices / config.vertices_per_primitive;
        if index.primitive_count() < stream_primitives {
            return Err(Error::Configuration(format!(
                "index buffer covers {} primitives but the stream holds {}",
                index.primitive_count(),
                stream_primitives
            ))
            .logged(SOURCE));
        }
        let addressable = index.index_type.addressable_vertices();
        if config.initial_capacity_vertices as u64 > addressable {
            return Err(Error::Configuration(format!(
                "{} vertices requested but {:?} indices address at most {}",
                config.initial_capacity_vertices, index.index_type, addressable
            ))
            .logged(SOURCE));
        }
        if let Some(max) = index.max_index() {
            if max as u64 >= addressable || max >= config.initial_capacity_vertices {
                return Err(Error::Configuration(format!(
                    "index {} is outside the {}-vertex stream",
                    max, config.initial_capacity_vertices
                ))
                .logged(SOURCE));
            }
        }
        Ok(())
    }

    // ===== BIND / UNBIND =====

    /// Bind to `program`, rebuilding the cached layout if it was built for another one
    pub fn bind(&mut self, program: ProgramId) -> Result<()> {
        let device = self.device.clone();
        let mut guard = lock_device(&device, SOURCE)?;
        self.bind_on(&mut *guard, program)
    }

    /// Clear the current layout
    pub fn unbind(&mut self) -> Result<()> {
        let device = self.device.clone();
        let mut guard = lock_device(&device, SOURCE)?;
        self.unbind_on(&mut *guard)
    }

    pub(crate) fn bind_on(&mut self, device: &mut dyn GraphicsDevice, program: ProgramId) -> Result<()> {
        if self.bound_program.is_some() {
            return Err(Error::InvalidState("already bound".to_string()).logged(SOURCE));
        }

        let layout = match self.layout_cache {
            Some(cache) if cache.program == program => cache.layout,
            _ => self.rebuild_layout(device, program)?,
        };
        device.bind_input_layout(Some(layout))?;
        self.bound_program = Some(program);
        Ok(())
    }

    pub(crate) fn unbind_on(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.bound_program.is_none() {
            return Err(Error::InvalidState("not bound".to_string()).logged(SOURCE));
        }
        device.bind_input_layout(None)?;
        self.bound_program = None;
        Ok(())
    }

    fn rebuild_layout(&mut self, device: &mut dyn GraphicsDevice, program: ProgramId) -> Result<InputLayoutId> {
        self.drop_layout_cache(device)?;

        let layout = device.create_input_layout(&InputLayoutDesc {
            program,
            vertex_buffer: self.vertex_buffer,
            index_buffer: self.index_buffer.map(|index| index.buffer),
            layout: self.vertex_layout.clone(),
        })?;
        for attribute in self.vertex_layout.attributes() {
            device.set_attribute_enabled(program, attribute, true)?;
        }
        self.layout_cache = Some(LayoutCache { program, layout });
        crate::engine_trace!(SOURCE, "[{}] input layout rebuilt for program {:?}", self.label, program);
        Ok(layout)
    }

    /// Deactivate the cached program's attributes and destroy its layout
    fn drop_layout_cache(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if let Some(cache) = self.layout_cache.take() {
            for attribute in self.vertex_layout.attributes() {
                device.set_attribute_enabled(cache.program, attribute, false)?;
            }
            device.destroy_input_layout(cache.layout);
        }
        Ok(())
    }

    // ===== BUFFER REPLACEMENT =====

    /// Swap the vertex buffer for a new one holding `capacity_vertices`
    ///
    /// The new buffer is created first, so a failed allocation leaves the
    /// old buffer and the binding untouched. A bound program is unbound
    /// around the swap and rebound to a layout over the new buffer.
    pub(crate) fn replace_vertex_buffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        capacity_vertices: u32,
    ) -> Result<()> {
        let new_buffer = device.create_buffer(
            &BufferDesc {
                size: capacity_vertices as u64 * self.vertex_layout.stride() as u64,
                usage: BufferUsage::Vertex,
                flags: self.buffer_flags,
            },
            None,
        )?;

        let program = self.bound_program;
        if program.is_some() {
            if let Err(err) = self.unbind_on(device) {
                device.destroy_buffer(new_buffer);
                return Err(err);
            }
        }
        // The cached layout references the old handle
        self.drop_layout_cache(device)?;
        device.destroy_buffer(self.vertex_buffer);
        self.vertex_buffer = new_buffer;
        self.capacity_vertices = capacity_vertices;

        if let Some(program) = program {
            self.bind_on(device, program)?;
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    pub fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    pub fn capacity_vertices(&self) -> u32 {
        self.capacity_vertices
    }

    /// Primitive size and per-primitive draw elements
    pub fn shape(&self) -> PrimitiveShape {
        self.shape
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_vertices as u64 * self.vertex_layout.stride() as u64
    }

    pub fn is_bound(&self) -> bool {
        self.bound_program.is_some()
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.bound_program
    }

    pub fn has_index_buffer(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn index_type(&self) -> Option<IndexType> {
        self.index_buffer.map(|index| index.index_type)
    }

    pub fn index_count(&self) -> Option<u32> {
        self.index_buffer.map(|index| index.index_count)
    }

    /// Program the cached layout was built for
    pub fn cached_program(&self) -> Option<ProgramId> {
        self.layout_cache.map(|cache| cache.program)
    }
}

impl Drop for AttributeBindingBase {
    fn drop(&mut self) {
        let device = self.device.clone();
        let mut guard = match device.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.bound_program.take().is_some() {
            guard.bind_input_layout(None).ok();
        }
        if let Some(cache) = self.layout_cache.take() {
            guard.destroy_input_layout(cache.layout);
        }
        guard.destroy_buffer(self.vertex_buffer);
        if let Some(index) = self.index_buffer.take() {
            guard.destroy_buffer(index.buffer);
        }
    }
}

#[cfg(test)]
#[path = "attribute_binding_tests.rs"]
mod tests;

/// Mock graphics device for unit tests (no GPU required)
///
/// Records every command in submission order, keeps buffer contents in CPU
/// memory, and simulates the GPU timeline: fences stay pending until a test
/// signals them (or `auto_signal` is set), and `wait_fence` completes the
/// fence as a real wait eventually would.

use std::sync::{Arc, Mutex};
use slotmap::SlotMap;

use crate::device::{
    BufferDesc, BufferId, DeviceCapabilities, FenceId, FenceStatus, GraphicsDevice, IndexType,
    InputLayoutDesc, InputLayoutId, PrimitiveTopology, ProgramId, SharedDevice, VertexAttribute,
    VertexLayout,
};
use crate::error::{Error, Result};
use crate::engine_bail;

// ============================================================================
// Mock command log
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    CreateBuffer { buffer: BufferId, size: u64 },
    DestroyBuffer(BufferId),
    WriteBuffer { buffer: BufferId, offset: u64, len: u64 },
    RespecifyBuffer { buffer: BufferId, len: u64 },
    CreateInputLayout { layout: InputLayoutId, program: ProgramId, vertex_buffer: BufferId },
    DestroyInputLayout(InputLayoutId),
    BindInputLayout(Option<InputLayoutId>),
    SetAttribute { program: ProgramId, slot: u32, enabled: bool },
    Draw { topology: PrimitiveTopology, first_vertex: u32, vertex_count: u32 },
    DrawIndexed { topology: PrimitiveTopology, first_index: u32, index_count: u32 },
    BeginImmediate(PrimitiveTopology),
    ImmediateVertex(Vec<u8>),
    EndImmediate,
    InsertFence(FenceId),
    WaitFence(FenceId),
    Flush,
}

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub desc: BufferDesc,
    pub data: Vec<u8>,
}

// ============================================================================
// Mock device
// ============================================================================

#[derive(Debug)]
pub struct MockGraphicsDevice {
    pub capabilities: DeviceCapabilities,
    pub buffers: SlotMap<BufferId, MockBuffer>,
    pub layouts: SlotMap<InputLayoutId, InputLayoutDesc>,
    pub fences: SlotMap<FenceId, FenceStatus>,
    pub current_layout: Option<InputLayoutId>,
    pub commands: Vec<MockCommand>,
    /// Fences are signaled as soon as they are inserted (idle GPU)
    pub auto_signal: bool,
    /// Largest buffer the device will allocate
    pub max_buffer_size: u64,
    in_immediate: bool,
}

impl MockGraphicsDevice {
    /// Create a mock device exposing the given capabilities
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            buffers: SlotMap::with_key(),
            layouts: SlotMap::with_key(),
            fences: SlotMap::with_key(),
            current_layout: None,
            commands: Vec::new(),
            auto_signal: false,
            max_buffer_size: 256 * 1024 * 1024,
            in_immediate: false,
        }
    }

    /// Device supporting every streaming strategy
    pub fn full() -> Self {
        Self::new(DeviceCapabilities::new(4, 6))
    }

    /// Device with buffer objects but no persistent mapping
    pub fn buffer_objects_only() -> Self {
        Self::new(
            DeviceCapabilities::new(2, 1)
                .with_extension("GL_ARB_vertex_array_object"),
        )
    }

    /// Device with only the minimal feature level
    pub fn minimal() -> Self {
        Self::new(DeviceCapabilities::new(1, 1))
    }

    /// Wrap into the shared handle strategies expect, keeping a typed handle
    pub fn shared(self) -> (Arc<Mutex<MockGraphicsDevice>>, SharedDevice) {
        let mock = Arc::new(Mutex::new(self));
        let shared: SharedDevice = mock.clone();
        (mock, shared)
    }

    /// Complete every pending fence (GPU catches up)
    pub fn signal_all_fences(&mut self) {
        for status in self.fences.values_mut() {
            *status = FenceStatus::Signaled;
        }
    }

    /// Number of fences not yet signaled
    pub fn pending_fence_count(&self) -> usize {
        self.fences.values().filter(|s| **s == FenceStatus::Pending).count()
    }

    /// Number of fences alive on the device
    pub fn live_fence_count(&self) -> usize {
        self.fences.len()
    }

    /// Number of buffers alive on the device
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Contents of a buffer
    pub fn buffer_data(&self, buffer: BufferId) -> &[u8] {
        &self.buffers[buffer].data
    }

    /// Draw commands only, in submission order
    pub fn draws(&self) -> Vec<MockCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, MockCommand::Draw { .. } | MockCommand::DrawIndexed { .. }))
            .cloned()
            .collect()
    }

    /// Number of fence waits issued
    pub fn wait_count(&self) -> usize {
        self.commands.iter().filter(|c| matches!(c, MockCommand::WaitFence(_))).count()
    }

    /// Forget recorded commands, keep resources
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn create_buffer(&mut self, desc: &BufferDesc, initial_data: Option<&[u8]>) -> Result<BufferId> {
        if desc.size > self.max_buffer_size {
            return Err(Error::OutOfMemory);
        }
        let mut data = vec![0u8; desc.size as usize];
        if let Some(initial) = initial_data {
            if initial.len() as u64 > desc.size {
                engine_bail!("galaxy3d::mock", "initial data larger than buffer");
            }
            data[..initial.len()].copy_from_slice(initial);
        }
        let buffer = self.buffers.insert(MockBuffer { desc: desc.clone(), data });
        self.commands.push(MockCommand::CreateBuffer { buffer, size: desc.size });
        Ok(buffer)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer);
        self.commands.push(MockCommand::DestroyBuffer(buffer));
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()> {
        let Some(target) = self.buffers.get_mut(buffer) else {
            engine_bail!("galaxy3d::mock", "write to unknown buffer {:?}", buffer);
        };
        let end = offset as usize + data.len();
        if end > target.data.len() {
            engine_bail!("galaxy3d::mock", "write [{}, {}) past buffer end {}", offset, end, target.data.len());
        }
        target.data[offset as usize..end].copy_from_slice(data);
        self.commands.push(MockCommand::WriteBuffer { buffer, offset, len: data.len() as u64 });
        Ok(())
    }

    fn respecify_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<()> {
        let Some(target) = self.buffers.get_mut(buffer) else {
            engine_bail!("galaxy3d::mock", "respecify of unknown buffer {:?}", buffer);
        };
        target.data = data.to_vec();
        target.desc.size = data.len() as u64;
        self.commands.push(MockCommand::RespecifyBuffer { buffer, len: data.len() as u64 });
        Ok(())
    }

    fn create_input_layout(&mut self, desc: &InputLayoutDesc) -> Result<InputLayoutId> {
        if !self.buffers.contains_key(desc.vertex_buffer) {
            engine_bail!("galaxy3d::mock", "input layout over unknown buffer");
        }
        let layout = self.layouts.insert(desc.clone());
        self.commands.push(MockCommand::CreateInputLayout {
            layout,
            program: desc.program,
            vertex_buffer: desc.vertex_buffer,
        });
        Ok(layout)
    }

    fn destroy_input_layout(&mut self, layout: InputLayoutId) {
        self.layouts.remove(layout);
        if self.current_layout == Some(layout) {
            self.current_layout = None;
        }
        self.commands.push(MockCommand::DestroyInputLayout(layout));
    }

    fn bind_input_layout(&mut self, layout: Option<InputLayoutId>) -> Result<()> {
        if let Some(id) = layout {
            if !self.layouts.contains_key(id) {
                engine_bail!("galaxy3d::mock", "bind of unknown input layout");
            }
        }
        self.current_layout = layout;
        self.commands.push(MockCommand::BindInputLayout(layout));
        Ok(())
    }

    fn set_attribute_enabled(
        &mut self,
        program: ProgramId,
        attribute: &VertexAttribute,
        enabled: bool,
    ) -> Result<()> {
        self.commands.push(MockCommand::SetAttribute { program, slot: attribute.slot, enabled });
        Ok(())
    }

    fn draw(&mut self, topology: PrimitiveTopology, first_vertex: u32, vertex_count: u32) -> Result<()> {
        if self.current_layout.is_none() {
            engine_bail!("galaxy3d::mock", "draw without an input layout");
        }
        self.commands.push(MockCommand::Draw { topology, first_vertex, vertex_count });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        _index_type: IndexType,
        first_index: u32,
        index_count: u32,
    ) -> Result<()> {
        let Some(layout) = self.current_layout else {
            engine_bail!("galaxy3d::mock", "indexed draw without an input layout");
        };
        if self.layouts[layout].index_buffer.is_none() {
            engine_bail!("galaxy3d::mock", "indexed draw without an index buffer");
        }
        self.commands.push(MockCommand::DrawIndexed { topology, first_index, index_count });
        Ok(())
    }

    fn begin_immediate(&mut self, topology: PrimitiveTopology) -> Result<()> {
        if self.in_immediate {
            engine_bail!("galaxy3d::mock", "nested immediate primitive");
        }
        self.in_immediate = true;
        self.commands.push(MockCommand::BeginImmediate(topology));
        Ok(())
    }

    fn immediate_vertex(&mut self, layout: &VertexLayout, vertex: &[u8]) -> Result<()> {
        if !self.in_immediate || vertex.len() != layout.stride() as usize {
            engine_bail!("galaxy3d::mock", "malformed immediate vertex");
        }
        self.commands.push(MockCommand::ImmediateVertex(vertex.to_vec()));
        Ok(())
    }

    fn end_immediate(&mut self) -> Result<()> {
        if !self.in_immediate {
            engine_bail!("galaxy3d::mock", "end_immediate without begin");
        }
        self.in_immediate = false;
        self.commands.push(MockCommand::EndImmediate);
        Ok(())
    }

    fn insert_fence(&mut self) -> Result<FenceId> {
        let status = if self.auto_signal { FenceStatus::Signaled } else { FenceStatus::Pending };
        let fence = self.fences.insert(status);
        self.commands.push(MockCommand::InsertFence(fence));
        Ok(fence)
    }

    fn fence_status(&self, fence: FenceId) -> FenceStatus {
        // A destroyed fence can no longer hold anything back
        self.fences.get(fence).copied().unwrap_or(FenceStatus::Signaled)
    }

    fn wait_fence(&mut self, fence: FenceId) -> Result<()> {
        if let Some(status) = self.fences.get_mut(fence) {
            *status = FenceStatus::Signaled;
        }
        self.commands.push(MockCommand::WaitFence(fence));
        Ok(())
    }

    fn destroy_fence(&mut self, fence: FenceId) {
        self.fences.remove(fence);
    }

    fn flush(&mut self) -> Result<()> {
        self.commands.push(MockCommand::Flush);
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;

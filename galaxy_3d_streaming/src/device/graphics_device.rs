/// GraphicsDevice trait - the narrow device interface driven by the streamers
///
/// The device is handle based: every resource a strategy creates is named by
/// a slotmap key and destroyed explicitly. Backends decide what a handle maps
/// to (GL object names, Vulkan buffers + fences, ...).

use std::sync::{Arc, Mutex, MutexGuard};
use bitflags::bitflags;
use slotmap::new_key_type;

use crate::device::{DeviceCapabilities, VertexAttribute, VertexLayout};
use crate::error::Result;
use crate::engine_err;

// ===== HANDLES =====

new_key_type! {
    /// Device buffer handle
    pub struct BufferId;

    /// Input layout handle (attribute bindings over a vertex buffer)
    pub struct InputLayoutId;

    /// Completion fence handle
    pub struct FenceId;
}

/// Opaque shader program handle
///
/// Strategies only compare programs by identity; the value is owned by
/// whoever created the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

// ===== BUFFERS =====

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
}

bitflags! {
    /// Storage flags requested at buffer creation
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufferFlags: u32 {
        /// Contents may be replaced after creation
        const DYNAMIC_STORAGE = 1 << 0;
        /// CPU may write through a mapping
        const MAP_WRITE = 1 << 1;
        /// Mapping stays valid while the GPU reads the buffer
        const MAP_PERSISTENT = 1 << 2;
        /// CPU writes become visible without explicit flushes
        const MAP_COHERENT = 1 << 3;
    }
}

impl BufferFlags {
    /// Flags of a persistently mapped streaming buffer
    pub fn persistent_write() -> Self {
        Self::MAP_WRITE | Self::MAP_PERSISTENT | Self::MAP_COHERENT
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
    /// Storage flags
    pub flags: BufferFlags,
}

// ===== DRAWING =====

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }

    /// Number of distinct vertices an index of this width can address
    pub fn addressable_vertices(&self) -> u64 {
        match self {
            IndexType::U16 => u16::MAX as u64 + 1,
            IndexType::U32 => u32::MAX as u64 + 1,
        }
    }
}

/// Descriptor for creating an input layout
#[derive(Debug, Clone)]
pub struct InputLayoutDesc {
    /// Program the attribute bindings are resolved against
    pub program: ProgramId,
    /// Vertex buffer the attributes read from
    pub vertex_buffer: BufferId,
    /// Index buffer captured by the layout, if any
    pub index_buffer: Option<BufferId>,
    /// Attribute layout
    pub layout: VertexLayout,
}

// ===== FENCES =====

/// Completion state of a fence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceStatus {
    /// The GPU has not finished the commands preceding the fence
    Pending,
    /// Every command submitted before the fence has completed
    Signaled,
}

// ===== DEVICE TRAIT =====

/// Graphics device interface
///
/// Implemented by backend devices and by the test mock. All calls come from
/// the single render thread; the only blocking call is `wait_fence`.
pub trait GraphicsDevice: Send + Sync {
    /// Capability snapshot, queried once at strategy selection
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Create a buffer, optionally filled with `initial_data`
    fn create_buffer(&mut self, desc: &BufferDesc, initial_data: Option<&[u8]>) -> Result<BufferId>;

    /// Destroy a buffer (deferred by the backend while the GPU still uses it)
    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Write into a persistently mapped buffer at a byte offset
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<()>;

    /// Replace the entire contents (and size) of a buffer, orphaning the old storage
    fn respecify_buffer(&mut self, buffer: BufferId, data: &[u8]) -> Result<()>;

    /// Create an input layout
    fn create_input_layout(&mut self, desc: &InputLayoutDesc) -> Result<InputLayoutId>;

    /// Destroy an input layout
    fn destroy_input_layout(&mut self, layout: InputLayoutId);

    /// Make a layout current, or clear the current layout with `None`
    fn bind_input_layout(&mut self, layout: Option<InputLayoutId>) -> Result<()>;

    /// Activate or deactivate one attribute of a program at its binding slot
    fn set_attribute_enabled(
        &mut self,
        program: ProgramId,
        attribute: &VertexAttribute,
        enabled: bool,
    ) -> Result<()>;

    /// Draw non-indexed vertices from the current layout
    fn draw(&mut self, topology: PrimitiveTopology, first_vertex: u32, vertex_count: u32) -> Result<()>;

    /// Draw indexed vertices from the current layout's index buffer
    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_type: IndexType,
        first_index: u32,
        index_count: u32,
    ) -> Result<()>;

    /// Start an immediate-mode primitive
    fn begin_immediate(&mut self, topology: PrimitiveTopology) -> Result<()>;

    /// Emit one vertex of the current immediate-mode primitive
    fn immediate_vertex(&mut self, layout: &VertexLayout, vertex: &[u8]) -> Result<()>;

    /// Finish the current immediate-mode primitive
    fn end_immediate(&mut self) -> Result<()>;

    /// Insert a fence after every command submitted so far
    fn insert_fence(&mut self) -> Result<FenceId>;

    /// Poll a fence without blocking
    fn fence_status(&self, fence: FenceId) -> FenceStatus;

    /// Block until the fence is signaled
    fn wait_fence(&mut self, fence: FenceId) -> Result<()>;

    /// Release a fence
    fn destroy_fence(&mut self, fence: FenceId);

    /// Submit pending commands to the GPU
    fn flush(&mut self) -> Result<()>;
}

/// Device shared between the call site and the strategies
pub type SharedDevice = Arc<Mutex<dyn GraphicsDevice>>;

/// Lock the shared device, mapping poisoning to a backend error
pub(crate) fn lock_device<'a>(
    device: &'a SharedDevice,
    source: &str,
) -> Result<MutexGuard<'a, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(|_| engine_err!(source, "Graphics device lock poisoned"))
}

/// Device module - the graphics device interface consumed by the streamers

// Module declarations
pub mod capabilities;
pub mod graphics_device;
pub mod vertex_layout;

// Re-export everything
pub use capabilities::*;
pub use graphics_device::*;
pub use vertex_layout::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;

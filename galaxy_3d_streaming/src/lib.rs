/*!
# Galaxy 3D Streaming

Per-frame vertex streaming for the Galaxy 3D sprite batch.

The batch hands every frame's vertices to a streaming strategy which uploads
them and issues the draws. The strategy is picked once from the device
capabilities, best first:

- **RingMappedStreamer**: persistently mapped ring buffer, fenced per region
- **RespecifyStreamer**: fresh buffer storage on every render
- **ImmediateFallbackStreamer**: per-vertex submission, no device buffer

Backends plug in by implementing the `GraphicsDevice` trait.
*/

// Internal modules
mod error;
pub mod log;
pub mod device;
pub mod stream;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Strategy contract and selection
    pub use crate::stream::{Streamer, StrategyKind, StrategySelector, StreamingStrategy};

    // Logging sub-module (types and entry points, macros stay internal)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        pub use crate::log::{set_logger, reset_logger, set_min_severity, min_severity, log, log_detailed};
    }

    // Device interface sub-module
    pub mod device {
        pub use crate::device::*;
    }

    // Streaming sub-module
    pub mod stream {
        pub use crate::stream::*;
    }
}

// Re-export math library at crate root
pub use glam;

/// Stream module - vertex streaming strategies and their selection

// Module declarations
pub mod attribute_binding;
pub mod completion;
pub mod config;
pub mod immediate;
pub mod respecify;
pub mod ring_mapped;
pub mod selector;
pub mod sprite_vertex;
pub mod streaming_strategy;

// Re-export everything
pub use attribute_binding::*;
pub use completion::*;
pub use config::*;
pub use immediate::*;
pub use respecify::*;
pub use ring_mapped::*;
pub use selector::*;
pub use sprite_vertex::*;
pub use streaming_strategy::*;

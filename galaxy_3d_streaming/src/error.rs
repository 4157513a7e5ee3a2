//! Error types for the Galaxy3D streaming layer
//!
//! Construction-time failures (unsupported device, malformed configuration)
//! and call-sequence failures (bind/unbind/render out of order) share a single
//! enum so every strategy returns the same `Result`.

use std::fmt;

/// Result type for streaming operations
pub type Result<T> = std::result::Result<T, Error>;

/// Streaming layer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No streaming strategy is satisfied by the device capabilities
    UnsupportedDevice(String),

    /// Malformed vertex layout, capacity, or index buffer description
    Configuration(String),

    /// Bind/Unbind/Render called out of the required sequence
    InvalidState(String),

    /// A render precondition was violated (counts, vertex size)
    Assertion(String),

    /// Backend-specific device error
    BackendError(String),

    /// The device could not allocate the requested buffer
    OutOfMemory,
}

impl Error {
    /// Log this error at Error severity and hand it back
    ///
    /// Used on every error path so failures show up in the engine log with
    /// the component that raised them.
    pub fn logged(self, source: &str) -> Self {
        crate::log::log(crate::log::LogSeverity::Error, source, self.to_string());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedDevice(msg) => write!(f, "Unsupported device: {}", msg),
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::Assertion(msg) => write!(f, "Assertion failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("galaxy3d::Device", "Unknown buffer {:?}", id);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an error message and return `Err(Error::BackendError)` from the caller
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

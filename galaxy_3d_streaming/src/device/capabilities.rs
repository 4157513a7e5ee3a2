/// Device capability snapshot and the version/extension predicate
///
/// A snapshot is taken once from the device and never changes, so every
/// predicate evaluated against it is pure.

use rustc_hash::FxHashSet;

/// Immutable description of what the graphics device exposes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Core API version (major, minor)
    version: (u32, u32),
    /// Extension names (e.g. "GL_ARB_buffer_storage")
    extensions: FxHashSet<String>,
}

impl DeviceCapabilities {
    /// Snapshot with a core version and no extensions
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            version: (major, minor),
            extensions: FxHashSet::default(),
        }
    }

    /// Add an extension (builder style)
    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.insert(name.into());
        self
    }

    /// Add several extensions (builder style)
    pub fn with_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions.extend(names.into_iter().map(Into::into));
        self
    }

    /// Core API version (major, minor)
    pub fn version(&self) -> (u32, u32) {
        self.version
    }

    /// Whether the named extension is exposed
    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Whether a feature is available
    ///
    /// The feature is available when the core version is at least
    /// `major.minor` (where it was promoted to core), or when the optional
    /// extension that provides it on older versions is exposed.
    pub fn has_capability(&self, major: u32, minor: u32, extension: Option<&str>) -> bool {
        if self.version >= (major, minor) {
            return true;
        }
        extension.is_some_and(|name| self.has_extension(name))
    }
}

/// One entry of a strategy's static capability predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityRequirement {
    pub major: u32,
    pub minor: u32,
    pub extension: Option<&'static str>,
}

impl CapabilityRequirement {
    pub const fn new(major: u32, minor: u32, extension: Option<&'static str>) -> Self {
        Self { major, minor, extension }
    }

    /// Evaluate against a snapshot
    pub fn is_met_by(&self, capabilities: &DeviceCapabilities) -> bool {
        capabilities.has_capability(self.major, self.minor, self.extension)
    }
}

/// Evaluate a conjunction of requirements
pub fn requirements_met(requirements: &[CapabilityRequirement], capabilities: &DeviceCapabilities) -> bool {
    requirements.iter().all(|r| r.is_met_by(capabilities))
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;

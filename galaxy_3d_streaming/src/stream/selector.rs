/// Strategy selection from device capabilities

use crate::device::{CapabilityRequirement, DeviceCapabilities, PrimitiveTopology, ProgramId, SharedDevice, VertexLayout};
use crate::error::{Error, Result};
use crate::stream::immediate::{ImmediateFallbackStreamer, IMMEDIATE_REQUIREMENTS};
use crate::stream::respecify::{RespecifyStreamer, RESPECIFY_REQUIREMENTS};
use crate::stream::ring_mapped::{RingMappedStreamer, RING_MAPPED_REQUIREMENTS};
use crate::stream::{StreamStats, StreamerConfig, StreamingStrategy};

const SOURCE: &str = "galaxy3d::StrategySelector";

/// Concrete streaming strategies, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    RingMapped,
    Respecify,
    ImmediateFallback,
}

impl StrategyKind {
    /// Capability predicates the strategy needs (all must hold)
    pub fn requirements(&self) -> &'static [CapabilityRequirement] {
        match self {
            StrategyKind::RingMapped => &RING_MAPPED_REQUIREMENTS,
            StrategyKind::Respecify => &RESPECIFY_REQUIREMENTS,
            StrategyKind::ImmediateFallback => &IMMEDIATE_REQUIREMENTS,
        }
    }

    pub fn is_supported(&self, capabilities: &DeviceCapabilities) -> bool {
        crate::device::requirements_met(self.requirements(), capabilities)
    }
}

/// Picks the best strategy a device supports
pub struct StrategySelector;

impl StrategySelector {
    /// Preference order, first supported wins
    pub const PREFERENCE: [StrategyKind; 3] = [
        StrategyKind::RingMapped,
        StrategyKind::Respecify,
        StrategyKind::ImmediateFallback,
    ];

    /// Best supported strategy kind
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedDevice` when no strategy's predicate holds.
    pub fn select_kind(capabilities: &DeviceCapabilities) -> Result<StrategyKind> {
        Self::PREFERENCE
            .iter()
            .copied()
            .find(|kind| kind.is_supported(capabilities))
            .ok_or_else(|| {
                let (major, minor) = capabilities.version();
                Error::UnsupportedDevice(format!(
                    "no streaming strategy runs on feature level {}.{}",
                    major, minor
                ))
                .logged(SOURCE)
            })
    }

    /// Create the streamer for `device`
    ///
    /// Honors `config.forced_strategy` when set, which must still be
    /// supported by the device.
    pub fn create(device: SharedDevice, vertex_layout: VertexLayout, config: &StreamerConfig) -> Result<Streamer> {
        let capabilities = crate::device::lock_device(&device, SOURCE)?.capabilities().clone();

        let kind = match config.forced_strategy {
            Some(forced) if forced.is_supported(&capabilities) => forced,
            Some(forced) => {
                return Err(Error::UnsupportedDevice(format!("{:?} forced but not supported", forced)).logged(SOURCE));
            }
            None => Self::select_kind(&capabilities)?,
        };
        crate::engine_info!(SOURCE, "[{}] streaming with {:?}", config.label, kind);

        Ok(match kind {
            StrategyKind::RingMapped => Streamer::RingMapped(RingMappedStreamer::new(device, vertex_layout, config)?),
            StrategyKind::Respecify => Streamer::Respecify(RespecifyStreamer::new(device, vertex_layout, config)?),
            StrategyKind::ImmediateFallback => {
                Streamer::ImmediateFallback(ImmediateFallbackStreamer::new(device, vertex_layout, config)?)
            }
        })
    }
}

/// Strategy chosen at runtime
pub enum Streamer {
    RingMapped(RingMappedStreamer),
    Respecify(RespecifyStreamer),
    ImmediateFallback(ImmediateFallbackStreamer),
}

impl Streamer {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Streamer::RingMapped(_) => StrategyKind::RingMapped,
            Streamer::Respecify(_) => StrategyKind::Respecify,
            Streamer::ImmediateFallback(_) => StrategyKind::ImmediateFallback,
        }
    }

    fn strategy(&self) -> &dyn StreamingStrategy {
        match self {
            Streamer::RingMapped(s) => s,
            Streamer::Respecify(s) => s,
            Streamer::ImmediateFallback(s) => s,
        }
    }

    fn strategy_mut(&mut self) -> &mut dyn StreamingStrategy {
        match self {
            Streamer::RingMapped(s) => s,
            Streamer::Respecify(s) => s,
            Streamer::ImmediateFallback(s) => s,
        }
    }
}

impl StreamingStrategy for Streamer {
    fn bind(&mut self, program: ProgramId) -> Result<()> {
        self.strategy_mut().bind(program)
    }

    fn unbind(&mut self) -> Result<()> {
        self.strategy_mut().unbind()
    }

    fn render(
        &mut self,
        topology: PrimitiveTopology,
        data: &[u8],
        used_count: u32,
        emit_count: u32,
    ) -> Result<()> {
        self.strategy_mut().render(topology, data, used_count, emit_count)
    }

    fn flush(&mut self) -> Result<()> {
        self.strategy_mut().flush()
    }

    fn vertex_layout(&self) -> &VertexLayout {
        self.strategy().vertex_layout()
    }

    fn stats(&self) -> StreamStats {
        self.strategy().stats()
    }
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;

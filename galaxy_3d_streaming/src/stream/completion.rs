/// Region-level completion tracking for streamed device memory
///
/// Every ring-mapped draw locks the byte range it reads by inserting a fence
/// right after the draw. Before the CPU writes a range again it waits on the
/// fences of every locked region overlapping it.

use crate::device::{FenceId, FenceStatus, GraphicsDevice};
use crate::error::Result;

/// Contiguous byte range of the stream buffer written by one render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingRegion {
    pub offset_bytes: u64,
    pub length_bytes: u64,
}

impl StreamingRegion {
    pub fn new(offset_bytes: u64, length_bytes: u64) -> Self {
        Self { offset_bytes, length_bytes }
    }

    /// One past the last byte
    pub fn end(&self) -> u64 {
        self.offset_bytes + self.length_bytes
    }

    /// Half-open overlap test; empty regions overlap nothing
    pub fn overlaps(&self, other: &StreamingRegion) -> bool {
        self.length_bytes > 0
            && other.length_bytes > 0
            && self.offset_bytes < other.end()
            && other.offset_bytes < self.end()
    }
}

/// A region together with the fence guarding it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedRegion {
    pub region: StreamingRegion,
    pub fence: FenceId,
}

/// Ordered collection of live completion tokens
#[derive(Debug, Default)]
pub struct CompletionTracker {
    locked: Vec<LockedRegion>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self { locked: Vec::new() }
    }

    /// Register a fence covering `region` for the draw just issued
    pub fn lock_range(&mut self, device: &mut dyn GraphicsDevice, region: StreamingRegion) -> Result<()> {
        let fence = device.insert_fence()?;
        self.locked.push(LockedRegion { region, fence });
        Ok(())
    }

    /// Wait for every locked region overlapping `region`
    ///
    /// Overlapping tokens are released once satisfied. Returns `true` when at
    /// least one of them was still pending, i.e. the CPU had to block.
    pub fn wait_for_range(&mut self, device: &mut dyn GraphicsDevice, region: StreamingRegion) -> Result<bool> {
        let mut stalled = false;
        let mut index = 0;
        while index < self.locked.len() {
            let locked = self.locked[index];
            if !locked.region.overlaps(&region) {
                index += 1;
                continue;
            }
            if device.fence_status(locked.fence) == FenceStatus::Pending {
                device.wait_fence(locked.fence)?;
                stalled = true;
            }
            device.destroy_fence(locked.fence);
            self.locked.remove(index);
        }
        Ok(stalled)
    }

    /// Wait for every locked region and clear the collection
    ///
    /// Returns `true` when at least one token was still pending.
    pub fn wait_for_all(&mut self, device: &mut dyn GraphicsDevice) -> Result<bool> {
        let mut stalled = false;
        while let Some(locked) = self.locked.first().copied() {
            if device.fence_status(locked.fence) == FenceStatus::Pending {
                device.wait_fence(locked.fence)?;
                stalled = true;
            }
            device.destroy_fence(locked.fence);
            self.locked.remove(0);
        }
        Ok(stalled)
    }

    /// Release every fence without waiting (owner is being dropped)
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        for locked in self.locked.drain(..) {
            device.destroy_fence(locked.fence);
        }
    }

    /// Live tokens, oldest first
    pub fn locked_regions(&self) -> &[LockedRegion] {
        &self.locked
    }

    /// Number of live tokens
    pub fn len(&self) -> usize {
        self.locked.len()
    }

    /// Whether no token is live
    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;

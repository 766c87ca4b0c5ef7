//! Core trait for abstracting dump access.

use crate::memory::error::DumpResult;

/// Trait for reading from a raw dump layer.
///
/// Offsets are flat file offsets. Hardware addresses are translated by the
/// region map before they reach a layer.
pub trait MemoryLayer: Send + Sync {
    /// Read `length` bytes starting at `offset`.
    fn read(&self, offset: u64, length: usize) -> DumpResult<Vec<u8>>;

    /// Check if the range `[offset, offset+length)` is backed by the layer.
    fn is_valid(&self, offset: u64, length: u64) -> bool;

    /// The name of this layer.
    fn name(&self) -> &str;

    /// Number of bytes in the layer.
    fn size(&self) -> u64;
}

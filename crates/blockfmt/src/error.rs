//! Error types for the block format crate.

use thiserror::Error;

/// Errors raised while resolving addresses or decoding blocks.
#[derive(Debug, Error)]
pub enum FormatError {
    /// An absolute address does not fall inside the region it was resolved against.
    #[error("Address {address:#x} outside region '{region}' (base={base:#x}, length={length:#x})")]
    RegionBounds {
        region: String,
        address: u32,
        base: u32,
        length: usize,
    },

    /// A read window runs past the end of the region.
    #[error("Truncated read in region '{region}': [{offset:#x}, {offset:#x}+{length:#x}) exceeds length {available:#x}")]
    TruncatedRead {
        region: String,
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Invalid region map: {0}")]
    InvalidRegionMap(String),

    #[error("Invalid segment plan: {0}")]
    InvalidSegmentPlan(String),

    /// The backing byte source failed underneath a region.
    #[error("Memory read error at source offset {offset:#x}: {msg}")]
    MemoryRead { offset: u64, msg: String },
}

impl FormatError {
    /// Create a RegionBounds error.
    pub fn region_bounds(region: impl Into<String>, address: u32, base: u32, length: usize) -> Self {
        FormatError::RegionBounds {
            region: region.into(),
            address,
            base,
            length,
        }
    }

    /// Create a TruncatedRead error.
    pub fn truncated_read(
        region: impl Into<String>,
        offset: usize,
        length: usize,
        available: usize,
    ) -> Self {
        FormatError::TruncatedRead {
            region: region.into(),
            offset,
            length,
            available,
        }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;

//! Named memory regions and absolute-address resolution.
//!
//! A flash dump stores several physically separate banks back to back in one
//! file. Each bank is described by a [`MemoryRegion`]: where it sits in the
//! file, how long it is, and the absolute hardware address its first byte
//! answers to. A [`RegionMap`] holds the full set of regions for a dump.

use crate::error::{FormatError, FormatResult};
use std::sync::Arc;

/// Trait for reading raw bytes from a dump source.
///
/// Offsets are flat file offsets, not hardware addresses.
pub trait MemoryAccess: Send + Sync {
    fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
    fn is_valid(&self, offset: u64, length: u64) -> bool;
}

/// In-memory dumps (and test fixtures).
impl MemoryAccess for Vec<u8> {
    fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let start = usize::try_from(offset)?;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= self.len())
            .ok_or_else(|| format!("read [{:#x}, +{:#x}) past end of buffer ({:#x})", offset, length, self.len()))?;
        Ok(self[start..end].to_vec())
    }

    fn is_valid(&self, offset: u64, length: u64) -> bool {
        offset
            .checked_add(length)
            .map(|end| end <= self.len() as u64)
            .unwrap_or(false)
    }
}

/// A contiguous slice of the dump that answers to a range of hardware addresses.
#[derive(Clone)]
pub struct MemoryRegion {
    name: String,
    base_address: u32,
    source_offset: u64,
    length: usize,
    source: Arc<dyn MemoryAccess>,
}

impl std::fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("name", &self.name)
            .field("base_address", &format_args!("{:#x}", self.base_address))
            .field("source_offset", &format_args!("{:#x}", self.source_offset))
            .field("length", &format_args!("{:#x}", self.length))
            .finish()
    }
}

impl MemoryRegion {
    /// Describe a region of `source`.
    ///
    /// Fails if `[source_offset, source_offset + length)` is not backed by the source.
    pub fn new(
        name: impl Into<String>,
        base_address: u32,
        source_offset: u64,
        length: usize,
        source: Arc<dyn MemoryAccess>,
    ) -> FormatResult<Self> {
        let name = name.into();
        if length > 0 && !source.is_valid(source_offset, length as u64) {
            return Err(FormatError::InvalidRegionMap(format!(
                "region '{}' [{:#x}, +{:#x}) exceeds its backing source",
                name, source_offset, length
            )));
        }
        Ok(MemoryRegion {
            name,
            base_address,
            source_offset,
            length,
            source,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    /// Offset of the region's first byte within the backing source.
    pub fn source_offset(&self) -> u64 {
        self.source_offset
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Translate an absolute address into an offset within this region.
    pub fn resolve(&self, address: u32) -> FormatResult<usize> {
        address
            .checked_sub(self.base_address)
            .map(|delta| delta as usize)
            .filter(|&offset| offset < self.length)
            .ok_or_else(|| FormatError::region_bounds(&self.name, address, self.base_address, self.length))
    }

    pub fn contains(&self, address: u32) -> bool {
        self.resolve(address).is_ok()
    }

    /// Read `length` bytes at a region-relative offset.
    ///
    /// The whole window must lie inside the region; there is no padding.
    pub fn read(&self, offset: usize, length: usize) -> FormatResult<Vec<u8>> {
        let in_bounds = offset
            .checked_add(length)
            .map(|end| end <= self.length)
            .unwrap_or(false);
        if !in_bounds {
            return Err(FormatError::truncated_read(&self.name, offset, length, self.length));
        }
        if length == 0 {
            return Ok(Vec::new());
        }

        let source_offset = self.source_offset + offset as u64;
        self.source
            .read(source_offset, length)
            .map_err(|e| FormatError::MemoryRead {
                offset: source_offset,
                msg: e.to_string(),
            })
    }

    /// Read a little-endian u32 at a region-relative offset.
    pub fn read_u32_le(&self, offset: usize) -> FormatResult<u32> {
        let bytes = self.read(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// The fixed set of regions carved out of one dump.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    regions: Vec<MemoryRegion>,
}

impl RegionMap {
    /// Build a map, rejecting duplicate names and regions that overlap in the source.
    pub fn new(regions: Vec<MemoryRegion>) -> FormatResult<Self> {
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                if a.name == b.name {
                    return Err(FormatError::InvalidRegionMap(format!(
                        "duplicate region name '{}'",
                        a.name
                    )));
                }
                let a_end = a.source_offset + a.length as u64;
                let b_end = b.source_offset + b.length as u64;
                if !a.is_empty() && !b.is_empty() && a.source_offset < b_end && b.source_offset < a_end {
                    return Err(FormatError::InvalidRegionMap(format!(
                        "regions '{}' and '{}' overlap in the source",
                        a.name, b.name
                    )));
                }
            }
        }
        Ok(RegionMap { regions })
    }

    /// Look up a region by name.
    pub fn region(&self, name: &str) -> FormatResult<&MemoryRegion> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| FormatError::UnknownRegion(name.to_string()))
    }

    /// Resolve an absolute address within the named region.
    pub fn resolve(&self, address: u32, region: &str) -> FormatResult<usize> {
        self.region(region)?.resolve(address)
    }

    /// The first declared region that contains `address`, if any.
    pub fn region_containing(&self, address: u32) -> Option<&MemoryRegion> {
        self.regions.iter().find(|r| r.contains(address))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(len: usize) -> Arc<dyn MemoryAccess> {
        Arc::new((0..len).map(|i| i as u8).collect::<Vec<u8>>())
    }

    fn two_bank_map() -> RegionMap {
        let src = source(0x300);
        RegionMap::new(vec![
            MemoryRegion::new("a", 0x8000_0000, 0, 0x100, src.clone()).unwrap(),
            MemoryRegion::new("b", 0x8080_0000, 0x100, 0x1FC, src).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_region_edges() {
        let map = two_bank_map();
        for region in map.iter() {
            let base = region.base_address();
            let last = base + region.len() as u32 - 1;
            assert_eq!(region.resolve(base).unwrap(), 0);
            assert_eq!(region.resolve(last).unwrap(), region.len() - 1);
        }
    }

    #[test]
    fn test_resolve_below_base_fails() {
        let map = two_bank_map();
        let err = map.resolve(0x7FFF_FFFF, "a").unwrap_err();
        assert!(matches!(err, FormatError::RegionBounds { address: 0x7FFF_FFFF, .. }));
    }

    #[test]
    fn test_resolve_past_end_fails() {
        let map = two_bank_map();
        assert!(map.resolve(0x8000_0100, "a").is_err());
        // an address of the other bank never resolves against this one
        assert!(map.resolve(0x8080_0000, "a").is_err());
    }

    #[test]
    fn test_unknown_region() {
        let map = two_bank_map();
        assert!(matches!(map.resolve(0x8000_0000, "nope"), Err(FormatError::UnknownRegion(_))));
    }

    #[test]
    fn test_region_containing() {
        let map = two_bank_map();
        assert_eq!(map.region_containing(0x8080_0010).unwrap().name(), "b");
        assert!(map.region_containing(0x8400_0000).is_none());
    }

    #[test]
    fn test_read_goes_through_source_offset() {
        let map = two_bank_map();
        let b = map.region("b").unwrap();
        assert_eq!(b.read(0, 2).unwrap(), vec![0x00, 0x01]);
        assert_eq!(b.read(0x10, 1).unwrap(), vec![0x10]);
    }

    #[test]
    fn test_read_past_region_end_is_truncated() {
        let map = two_bank_map();
        let a = map.region("a").unwrap();
        assert!(a.read(0xFC, 4).is_ok());
        let err = a.read(0xFD, 4).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedRead { available: 0x100, .. }));
        assert!(a.read(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_read_u32_le() {
        let region = MemoryRegion::new("r", 0, 0, 8, Arc::new(vec![0x78, 0x56, 0x34, 0x12, 0, 0, 0, 0])).unwrap();
        assert_eq!(region.read_u32_le(0).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_region_larger_than_source_rejected() {
        let err = MemoryRegion::new("big", 0, 0x80, 0x100, source(0x100)).unwrap_err();
        assert!(matches!(err, FormatError::InvalidRegionMap(_)));
    }

    #[test]
    fn test_overlapping_regions_rejected() {
        let src = source(0x200);
        let result = RegionMap::new(vec![
            MemoryRegion::new("a", 0x1000, 0, 0x100, src.clone()).unwrap(),
            MemoryRegion::new("b", 0x2000, 0xFF, 0x10, src).unwrap(),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let src = source(0x200);
        let result = RegionMap::new(vec![
            MemoryRegion::new("a", 0x1000, 0, 0x10, src.clone()).unwrap(),
            MemoryRegion::new("a", 0x2000, 0x100, 0x10, src).unwrap(),
        ]);
        assert!(result.is_err());
    }
}

//! Flash layout of the supported controller family.
//!
//! The 8 MiB dump holds the two internal program flash banks followed by the
//! external flash. File ranges are end-exclusive; the last few bytes of each
//! bank are not part of any region.

use crate::memory::error::DumpResult;
use blockfmt::{MemoryAccess, MemoryRegion, RegionMap, Segment, SegmentPlan};
use std::sync::Arc;

/// Exact size of a supported dump.
pub const DUMP_SIZE: u64 = 0x80_0000;

/// Offset of the alternate bootloader header from the start of bank 0.
pub const ENTRY_OFFSET: u32 = 0x1_8000;

/// One bank carved out of the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bank {
    pub name: &'static str,
    pub file_start: u64,
    pub file_end: u64,
    pub base_address: u32,
}

impl Bank {
    pub const fn len(&self) -> usize {
        (self.file_end - self.file_start) as usize
    }
}

pub const PMU0: Bank = Bank {
    name: "pmu0",
    file_start: 0x00_0000,
    file_end: 0x1F_FFFF,
    base_address: 0x8000_0000,
};

pub const PMU1: Bank = Bank {
    name: "pmu1",
    file_start: 0x20_0000,
    file_end: 0x3F_FFFC,
    base_address: 0x8080_0000,
};

pub const EXTERNAL: Bank = Bank {
    name: "external",
    file_start: 0x40_0000,
    file_end: 0x7F_FFFB,
    base_address: 0x8400_0000,
};

pub const BANKS: [Bank; 3] = [PMU0, PMU1, EXTERNAL];

/// Address of the first block header.
pub const fn entry_address() -> u32 {
    PMU0.base_address + ENTRY_OFFSET
}

/// Five blocks in bank 0, one in bank 1, two in external flash.
pub fn default_plan() -> SegmentPlan {
    SegmentPlan::new(vec![
        Segment::new(PMU0.name, 5),
        Segment::new(PMU1.name, 1),
        Segment::new(EXTERNAL.name, 2),
    ])
}

/// Build the region map for a dump.
pub fn region_map(source: Arc<dyn MemoryAccess>) -> DumpResult<RegionMap> {
    let regions = BANKS
        .iter()
        .map(|bank| MemoryRegion::new(bank.name, bank.base_address, bank.file_start, bank.len(), source.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RegionMap::new(regions)?)
}

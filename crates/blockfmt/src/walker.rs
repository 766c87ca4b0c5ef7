//! Chain walking across regions.
//!
//! Each block header carries the absolute address of the next header. The
//! chain crosses from one bank to the next at points that are known ahead of
//! time for a given firmware family, so the walk is driven by a
//! [`SegmentPlan`]: decode N blocks in region A, then M blocks in region B,
//! and so on. The plan is the only termination condition.

use crate::error::{FormatError, FormatResult};
use crate::reader::decode_block;
use crate::region::RegionMap;
use crate::types::Block;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// `block_count` consecutive blocks decoded from `region`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub region: String,
    pub block_count: usize,
}

impl Segment {
    pub fn new(region: impl Into<String>, block_count: usize) -> Self {
        Segment {
            region: region.into(),
            block_count,
        }
    }
}

/// Ordered list of segments describing where the chain hands off between regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentPlan {
    segments: Vec<Segment>,
}

impl SegmentPlan {
    pub fn new(segments: Vec<Segment>) -> Self {
        SegmentPlan { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total number of blocks the plan will decode.
    pub fn total_blocks(&self) -> usize {
        self.segments.iter().map(|s| s.block_count).sum()
    }

    /// Check that every segment names a region present in `map`.
    pub fn validate(&self, map: &RegionMap) -> FormatResult<()> {
        for segment in &self.segments {
            map.region(&segment.region)?;
        }
        Ok(())
    }
}

/// Parses `region:count` pairs separated by commas, e.g. `pmu0:5,pmu1:1,external:2`.
impl FromStr for SegmentPlan {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (region, count) = part
                .split_once(':')
                .ok_or_else(|| FormatError::InvalidSegmentPlan(format!("expected region:count, got '{}'", part)))?;
            let region = region.trim();
            if region.is_empty() {
                return Err(FormatError::InvalidSegmentPlan(format!("missing region name in '{}'", part)));
            }
            let block_count = count
                .trim()
                .parse::<usize>()
                .map_err(|e| FormatError::InvalidSegmentPlan(format!("bad block count in '{}': {}", part, e)))?;
            segments.push(Segment::new(region, block_count));
        }
        if segments.is_empty() {
            return Err(FormatError::InvalidSegmentPlan("plan has no segments".to_string()));
        }
        Ok(SegmentPlan { segments })
    }
}

impl fmt::Display for SegmentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .segments
            .iter()
            .map(|s| format!("{}:{}", s.region, s.block_count))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// A block together with where the walk found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedBlock {
    /// 1-based position in the chain.
    pub ordinal: usize,
    /// Index into the plan's segments.
    pub segment: usize,
    pub region: String,
    pub block: Block,
}

/// Follows next-sector pointers according to a segment plan.
pub struct ChainWalker<'a> {
    map: &'a RegionMap,
    plan: SegmentPlan,
    segment: usize,
    taken_in_segment: usize,
    next_address: u32,
    visited: usize,
    finished: bool,
}

impl<'a> ChainWalker<'a> {
    /// Start a walk at `entry_address`, in the plan's first region.
    pub fn new(map: &'a RegionMap, plan: SegmentPlan, entry_address: u32) -> FormatResult<Self> {
        plan.validate(map)?;
        Ok(ChainWalker {
            map,
            plan,
            segment: 0,
            taken_in_segment: 0,
            next_address: entry_address,
            visited: 0,
            finished: false,
        })
    }

    /// Address the next block will be decoded from.
    pub fn next_address(&self) -> u32 {
        self.next_address
    }

    pub fn plan(&self) -> &SegmentPlan {
        &self.plan
    }

    /// Decode the next block, or `None` once the plan is exhausted.
    ///
    /// An error ends the walk; later calls return `None`.
    pub fn next_block(&mut self) -> FormatResult<Option<WalkedBlock>> {
        if self.finished {
            return Ok(None);
        }

        let segments = self.plan.segments();
        while self.segment < segments.len() && self.taken_in_segment >= segments[self.segment].block_count {
            self.segment += 1;
            self.taken_in_segment = 0;
            if let Some(next) = segments.get(self.segment) {
                debug!("Switching to region '{}' for {} block(s)", next.region, next.block_count);
            }
        }

        let Some(segment) = segments.get(self.segment) else {
            self.finished = true;
            return Ok(None);
        };

        let region = self.map.region(&segment.region)?;
        info!("Reading block {} at {:#x}", self.visited + 1, self.next_address);

        let block = match decode_block(region, region, self.next_address) {
            Ok(block) => block,
            Err(e) => {
                self.finished = true;
                if let FormatError::RegionBounds { address, .. } = &e {
                    if let Some(actual) = self.map.region_containing(*address) {
                        warn!(
                            "Address {:#x} lies in region '{}' but the plan expects '{}'",
                            address,
                            actual.name(),
                            segment.region
                        );
                    }
                }
                return Err(e);
            }
        };

        self.taken_in_segment += 1;
        self.visited += 1;
        self.next_address = block.next_sector_address;

        Ok(Some(WalkedBlock {
            ordinal: self.visited,
            segment: self.segment,
            region: segment.region.clone(),
            block,
        }))
    }

    /// Feed every block to `sink`, stopping at the first error.
    ///
    /// Returns the number of blocks handed to the sink.
    pub fn walk<E, F>(&mut self, mut sink: F) -> Result<usize, E>
    where
        E: From<FormatError>,
        F: FnMut(WalkedBlock) -> Result<(), E>,
    {
        let mut count = 0;
        while let Some(walked) = self.next_block()? {
            sink(walked)?;
            count += 1;
        }
        Ok(count)
    }

    /// Collect all remaining blocks.
    pub fn collect_all(&mut self) -> FormatResult<Vec<WalkedBlock>> {
        let mut results = Vec::new();
        while let Some(walked) = self.next_block()? {
            results.push(walked);
        }
        Ok(results)
    }
}

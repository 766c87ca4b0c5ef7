//! Block chain decoder for engine controller flash dumps.
//!
//! The firmware in these controllers is partitioned into blocks (startup
//! code, application software, datasets, calibration constants). Every block
//! starts with a fixed 48-byte header that points at the next one, forming a
//! chain that runs through two internal flash banks and then the external
//! flash. This crate provides:
//!
//! - [`RegionMap`] / [`MemoryRegion`] for translating absolute hardware
//!   addresses into offsets within the dump
//! - [`read_table`] and [`decode_block`] for the header and its two pointer tables
//! - [`ChainWalker`] for following the chain according to a [`SegmentPlan`]
//!
//! # Example
//!
//! ```rust,ignore
//! use blockfmt::{ChainWalker, SegmentPlan};
//!
//! let plan: SegmentPlan = "pmu0:5,pmu1:1,external:2".parse()?;
//! let mut walker = ChainWalker::new(&regions, plan, 0x8001_8000)?;
//! while let Some(walked) = walker.next_block()? {
//!     println!("{:#x} {:?}", walked.block.identifier_code, walked.block.label());
//! }
//! ```

pub mod error;
pub mod reader;
pub mod region;
pub mod types;
pub mod walker;

pub use error::{FormatError, FormatResult};
pub use reader::{decode_block, encode_header, read_table, HeaderFields};
pub use region::{MemoryAccess, MemoryRegion, RegionMap};
pub use types::{block_label, Block, ChecksumStructures, HEADER_SIZE, IDENTIFIER_LEN};
pub use walker::{ChainWalker, Segment, SegmentPlan, WalkedBlock};

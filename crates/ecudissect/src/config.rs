//! Run configuration.

use crate::layout;
use crate::report::ReportFormat;
use blockfmt::SegmentPlan;
use std::path::PathBuf;

pub struct DissectConfig {
    pub dump_path: PathBuf,
    pub out_dir: PathBuf,
    pub plan: SegmentPlan,
    pub entry_address: u32,
    pub format: ReportFormat,
}

impl DissectConfig {
    /// Defaults for the supported controller family.
    pub fn new(dump_path: impl Into<PathBuf>) -> Self {
        Self {
            dump_path: dump_path.into(),
            out_dir: PathBuf::from("."),
            plan: layout::default_plan(),
            entry_address: layout::entry_address(),
            format: ReportFormat::default(),
        }
    }
}

/// Parse an address given as `0x`-prefixed hex or decimal.
pub fn parse_address(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex.replace('_', "").as_str(), 16).map_err(|e| format!("invalid hex address '{}': {}", s, e))
    } else {
        s.parse::<u32>().map_err(|e| format!("invalid address '{}': {}", s, e))
    }
}

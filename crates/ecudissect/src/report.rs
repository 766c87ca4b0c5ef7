//! Per-block diagnostic records.

use blockfmt::{ChecksumStructures, WalkedBlock};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write as _;

/// How reports are printed on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One pretty-printed JSON object per block.
    #[default]
    Json,
    /// A short human-readable summary per block.
    Text,
}

/// Diagnostic view of a decoded block. Numbers are lowercase hex without prefix.
#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub ordinal: usize,
    pub region: String,
    pub block_start: String,
    pub flat_address: String,
    pub block_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    pub size: String,
    pub next_sector: String,
    pub block_end: String,
    pub table1_pointer: String,
    pub table2_pointer: String,
    pub table1_size: String,
    pub table2_size: String,
    pub table1: Vec<String>,
    pub table2: Vec<String>,
    pub identifier: String,
    pub number_of_checksum_structures: String,
    pub checksum_structures: ChecksumStructures,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

fn hex<T: std::fmt::LowerHex>(value: T) -> String {
    format!("{:x}", value)
}

impl BlockReport {
    pub fn new(walked: &WalkedBlock) -> Self {
        let block = &walked.block;
        BlockReport {
            ordinal: walked.ordinal,
            region: walked.region.clone(),
            block_start: hex(block.start_address),
            flat_address: hex(block.flat_offset),
            block_identifier: hex(block.identifier_code),
            label: block.label(),
            size: hex(block.size),
            next_sector: hex(block.next_sector_address),
            block_end: hex(block.block_end_address),
            table1_pointer: hex(block.table1_pointer),
            table2_pointer: hex(block.table2_pointer),
            table1_size: hex(block.table1_count),
            table2_size: hex(block.table2_count),
            table1: block.table1.iter().copied().map(hex).collect(),
            table2: block.table2.iter().copied().map(hex).collect(),
            identifier: block.identifier_text(),
            number_of_checksum_structures: hex(block.checksum_structure_count()),
            checksum_structures: block.checksum_structures,
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Render as a short text block.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let label = self.label.unwrap_or("unknown");
        let _ = writeln!(
            out,
            "block {} [{}] at {} (offset {}): id={} ({}) \"{}\"",
            self.ordinal, self.region, self.block_start, self.flat_address, self.block_identifier, label, self.identifier
        );
        let _ = writeln!(
            out,
            "  size={} next={} end={} checksums={}",
            self.size, self.next_sector, self.block_end, self.number_of_checksum_structures
        );
        let _ = writeln!(
            out,
            "  table1@{} [{}]: {}",
            self.table1_pointer,
            self.table1_size,
            self.table1.join(" ")
        );
        let _ = writeln!(
            out,
            "  table2@{} [{}]: {}",
            self.table2_pointer,
            self.table2_size,
            self.table2.join(" ")
        );
        if let Some(artifact) = &self.artifact {
            let _ = writeln!(out, "  -> {}", artifact);
        }
        out
    }

    /// Render in the requested format.
    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Json => serde_json::to_string_pretty(self),
            ReportFormat::Text => Ok(self.render_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfmt::{Block, HeaderFields};

    fn walked() -> WalkedBlock {
        WalkedBlock {
            ordinal: 4,
            segment: 0,
            region: "pmu0".to_string(),
            block: Block {
                start_address: 0x8002_0000,
                flat_offset: 0x2_0000,
                identifier_code: 0x40,
                size: 0x1_0000,
                next_sector_address: 0x8003_0000,
                block_end_address: 0x8002_FFFF,
                table1_pointer: 0x8002_0100,
                table2_pointer: 0x8002_0200,
                table1_count: 2,
                table2_count: 0,
                identifier: HeaderFields::identifier_from("SB_V1234"),
                checksum_structures: ChecksumStructures::NotDecoded { count: 0x11 },
                table1: vec![0xDEAD_BEEF, 0x10],
                table2: vec![],
                payload: vec![],
            },
        }
    }

    #[test]
    fn test_fields_are_hex() {
        let report = BlockReport::new(&walked());
        assert_eq!(report.block_start, "80020000");
        assert_eq!(report.flat_address, "20000");
        assert_eq!(report.block_identifier, "40");
        assert_eq!(report.label, Some("Application software #0"));
        assert_eq!(report.table1, vec!["deadbeef", "10"]);
        assert!(report.table2.is_empty());
        assert_eq!(report.identifier, "SB_V1234");
        assert_eq!(report.number_of_checksum_structures, "11");
    }

    #[test]
    fn test_json_rendering() {
        let report = BlockReport::new(&walked()).with_artifact("out/40.bin");
        let json: serde_json::Value = serde_json::from_str(&report.render(ReportFormat::Json).unwrap()).unwrap();
        assert_eq!(json["block_identifier"], "40");
        assert_eq!(json["checksum_structures"]["state"], "not_decoded");
        assert_eq!(json["artifact"], "out/40.bin");
    }

    #[test]
    fn test_unknown_label_omitted() {
        let mut w = walked();
        w.block.identifier_code = 0x77;
        let report = BlockReport::new(&w);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("label").is_none());
        assert!(report.render_text().contains("(unknown)"));
    }

    #[test]
    fn test_text_rendering() {
        let text = BlockReport::new(&walked()).render(ReportFormat::Text).unwrap();
        assert!(text.starts_with("block 4 [pmu0] at 80020000"));
        assert!(text.contains("table1@80020100 [2]: deadbeef 10"));
    }
}

//! Decoded block records.

use serde::Serialize;

/// Size of the fixed block header in bytes.
pub const HEADER_SIZE: usize = 48;

/// Length of the ASCII identifier embedded in the header.
pub const IDENTIFIER_LEN: usize = 18;

/// Field offsets within the block header.
pub mod offsets {
    pub const IDENTIFIER_CODE: usize = 0;
    pub const SIZE: usize = 4;
    pub const NEXT_SECTOR: usize = 8;
    pub const BLOCK_END: usize = 12;
    pub const TABLE1_POINTER: usize = 16;
    pub const TABLE2_POINTER: usize = 20;
    pub const TABLE1_COUNT: usize = 24;
    pub const TABLE2_COUNT: usize = 25;
    pub const IDENTIFIER: usize = 26;
    pub const CHECKSUM_COUNT: usize = 44;
}

/// Known block identifier codes.
const BLOCK_LABELS: &[(u32, &str)] = &[
    (0x10, "Startup block"),
    (0x20, "Tuning protection"),
    (0x30, "Customer block"),
    (0x40, "Application software #0"),
    (0x50, "Application software #1"),
    (0x60, "Dataset #0"),
    (0x90, "Customer tuning protection"),
    (0xA0, "Application software #2"),
    (0xC0, "Absolute constants #0"),
];

/// Human-readable label for a block identifier code, if the code is known.
pub fn block_label(code: u32) -> Option<&'static str> {
    BLOCK_LABELS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
}

/// Checksum structures that follow the header.
///
/// Their layout has not been worked out, so only the count from the header is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChecksumStructures {
    NotDecoded { count: u32 },
}

/// A decoded block header plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Absolute address of the header.
    pub start_address: u32,
    /// Offset of the header within its region.
    pub flat_offset: usize,
    pub identifier_code: u32,
    pub size: u32,
    pub next_sector_address: u32,
    pub block_end_address: u32,
    pub table1_pointer: u32,
    pub table2_pointer: u32,
    pub table1_count: u8,
    pub table2_count: u8,
    pub identifier: [u8; IDENTIFIER_LEN],
    pub checksum_structures: ChecksumStructures,
    pub table1: Vec<u32>,
    pub table2: Vec<u32>,
    /// `size` bytes starting at the header.
    pub payload: Vec<u8>,
}

impl Block {
    pub fn label(&self) -> Option<&'static str> {
        block_label(self.identifier_code)
    }

    /// The identifier as text, with NUL and space padding trimmed.
    pub fn identifier_text(&self) -> String {
        String::from_utf8_lossy(&self.identifier)
            .trim_end_matches(['\0', ' '])
            .to_string()
    }

    pub fn checksum_structure_count(&self) -> u32 {
        match self.checksum_structures {
            ChecksumStructures::NotDecoded { count } => count,
        }
    }
}

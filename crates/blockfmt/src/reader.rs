//! Block header and pointer table decoding.
//!
//! Everything here reads through a [`MemoryRegion`], so every access is
//! bounds-checked against the region before it touches the source.

use crate::error::FormatResult;
use crate::region::MemoryRegion;
use crate::types::{block_label, offsets, Block, ChecksumStructures, HEADER_SIZE, IDENTIFIER_LEN};
use tracing::{debug, warn};

/// Read `count` little-endian u32 words starting at the absolute address `pointer`.
pub fn read_table(region: &MemoryRegion, pointer: u32, count: u8) -> FormatResult<Vec<u32>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let offset = region.resolve(pointer)?;
    let bytes = region.read(offset, count as usize * 4)?;

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Decode the block whose header sits at `address` in `region`.
///
/// The pointer tables are read from `table_region`, which for this firmware
/// family is the same region as the header.
pub fn decode_block(region: &MemoryRegion, table_region: &MemoryRegion, address: u32) -> FormatResult<Block> {
    let flat_offset = region.resolve(address)?;
    let header = region.read(flat_offset, HEADER_SIZE)?;

    let u32_at = |at: usize| u32::from_le_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);

    let identifier_code = u32_at(offsets::IDENTIFIER_CODE);
    let size = u32_at(offsets::SIZE);
    let next_sector_address = u32_at(offsets::NEXT_SECTOR);
    let block_end_address = u32_at(offsets::BLOCK_END);
    let table1_pointer = u32_at(offsets::TABLE1_POINTER);
    let table2_pointer = u32_at(offsets::TABLE2_POINTER);
    let table1_count = header[offsets::TABLE1_COUNT];
    let table2_count = header[offsets::TABLE2_COUNT];
    let mut identifier = [0u8; IDENTIFIER_LEN];
    identifier.copy_from_slice(&header[offsets::IDENTIFIER..offsets::IDENTIFIER + IDENTIFIER_LEN]);
    let checksum_count = u32_at(offsets::CHECKSUM_COUNT);

    debug!(
        "Block header at {:#x} (region '{}' offset {:#x}): code={:#x} size={:#x} next={:#x}",
        address,
        region.name(),
        flat_offset,
        identifier_code,
        size,
        next_sector_address
    );

    if block_label(identifier_code).is_none() {
        warn!("Unrecognized block identifier {:#x} at {:#x}", identifier_code, address);
    }

    let payload = region.read(flat_offset, size as usize)?;
    let table1 = read_table(table_region, table1_pointer, table1_count)?;
    let table2 = read_table(table_region, table2_pointer, table2_count)?;

    Ok(Block {
        start_address: address,
        flat_offset,
        identifier_code,
        size,
        next_sector_address,
        block_end_address,
        table1_pointer,
        table2_pointer,
        table1_count,
        table2_count,
        identifier,
        checksum_structures: ChecksumStructures::NotDecoded { count: checksum_count },
        table1,
        table2,
        payload,
    })
}

/// Serialize a block header in the on-flash layout.
///
/// Used to build synthetic dumps; the inverse of the header part of [`decode_block`].
pub fn encode_header(block: &HeaderFields) -> [u8; HEADER_SIZE] {
    let mut out = [0u8; HEADER_SIZE];
    out[offsets::IDENTIFIER_CODE..][..4].copy_from_slice(&block.identifier_code.to_le_bytes());
    out[offsets::SIZE..][..4].copy_from_slice(&block.size.to_le_bytes());
    out[offsets::NEXT_SECTOR..][..4].copy_from_slice(&block.next_sector_address.to_le_bytes());
    out[offsets::BLOCK_END..][..4].copy_from_slice(&block.block_end_address.to_le_bytes());
    out[offsets::TABLE1_POINTER..][..4].copy_from_slice(&block.table1_pointer.to_le_bytes());
    out[offsets::TABLE2_POINTER..][..4].copy_from_slice(&block.table2_pointer.to_le_bytes());
    out[offsets::TABLE1_COUNT] = block.table1_count;
    out[offsets::TABLE2_COUNT] = block.table2_count;
    out[offsets::IDENTIFIER..][..IDENTIFIER_LEN].copy_from_slice(&block.identifier);
    out[offsets::CHECKSUM_COUNT..][..4].copy_from_slice(&block.checksum_count.to_le_bytes());
    out
}

/// Raw header fields, as laid out on flash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub identifier_code: u32,
    pub size: u32,
    pub next_sector_address: u32,
    pub block_end_address: u32,
    pub table1_pointer: u32,
    pub table2_pointer: u32,
    pub table1_count: u8,
    pub table2_count: u8,
    pub identifier: [u8; IDENTIFIER_LEN],
    pub checksum_count: u32,
}

impl HeaderFields {
    /// Pad or cut `text` into the fixed identifier field.
    pub fn identifier_from(text: &str) -> [u8; IDENTIFIER_LEN] {
        let mut out = [0u8; IDENTIFIER_LEN];
        let bytes = text.as_bytes();
        let n = bytes.len().min(IDENTIFIER_LEN);
        out[..n].copy_from_slice(&bytes[..n]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use std::sync::Arc;

    const BASE: u32 = 0x8000_0000;

    fn region_with(bytes: Vec<u8>) -> MemoryRegion {
        let len = bytes.len();
        MemoryRegion::new("synthetic", BASE, 0, len, Arc::new(bytes)).unwrap()
    }

    fn app_header() -> HeaderFields {
        HeaderFields {
            identifier_code: 0x40,
            size: 0x80,
            next_sector_address: BASE + 0x100,
            block_end_address: BASE + 0x7F,
            table1_pointer: BASE + 0x40,
            table2_pointer: BASE + 0x50,
            table1_count: 3,
            table2_count: 2,
            identifier: HeaderFields::identifier_from("SC800H6300000000"),
            checksum_count: 4,
        }
    }

    fn image_with_header(at: usize, fields: &HeaderFields, len: usize) -> Vec<u8> {
        let mut bytes: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        bytes[at..at + HEADER_SIZE].copy_from_slice(&encode_header(fields));
        bytes
    }

    #[test]
    fn test_read_table_values() {
        let mut bytes = vec![0u8; 32];
        bytes[4..8].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        bytes[8..12].copy_from_slice(&0x8000_1234u32.to_le_bytes());
        bytes[12..16].copy_from_slice(&1u32.to_le_bytes());
        let region = region_with(bytes);

        let table = read_table(&region, BASE + 4, 3).unwrap();
        assert_eq!(table, vec![0xDEAD_BEEF, 0x8000_1234, 1]);
    }

    #[test]
    fn test_read_table_unaligned_pointer() {
        let bytes: Vec<u8> = (0..16).collect();
        let region = region_with(bytes);

        let table = read_table(&region, BASE + 1, 2).unwrap();
        assert_eq!(table, vec![u32::from_le_bytes([1, 2, 3, 4]), u32::from_le_bytes([5, 6, 7, 8])]);
    }

    #[test]
    fn test_read_table_truncated() {
        let region = region_with(vec![0u8; 16]);

        let err = read_table(&region, BASE, 5).unwrap_err();
        assert!(matches!(
            err,
            FormatError::TruncatedRead { length: 20, available: 16, .. }
        ));
    }

    #[test]
    fn test_read_table_empty_skips_pointer() {
        let region = region_with(vec![0u8; 16]);
        assert!(read_table(&region, 0xFFFF_FFFF, 0).unwrap().is_empty());
    }

    #[test]
    fn test_read_table_pointer_outside_region() {
        let region = region_with(vec![0u8; 16]);
        let err = read_table(&region, 0x8400_0000, 1).unwrap_err();
        assert!(matches!(err, FormatError::RegionBounds { .. }));
    }

    #[test]
    fn test_decode_application_block() {
        let fields = app_header();
        let bytes = image_with_header(0, &fields, 0x100);
        let region = region_with(bytes.clone());

        let block = decode_block(&region, &region, BASE).unwrap();
        assert_eq!(block.identifier_code, 0x40);
        assert_eq!(block.label(), Some("Application software #0"));
        assert_eq!(block.flat_offset, 0);
        assert_eq!(block.size, 0x80);
        assert_eq!(block.next_sector_address, BASE + 0x100);
        assert_eq!(block.block_end_address, BASE + 0x7F);
        assert_eq!(block.identifier_text(), "SC800H6300000000");
        assert_eq!(block.checksum_structure_count(), 4);
        assert_eq!(block.checksum_structures, ChecksumStructures::NotDecoded { count: 4 });
        assert_eq!(block.table1.len(), 3);
        assert_eq!(block.table2.len(), 2);
        assert_eq!(block.table1[0], u32::from_le_bytes(bytes[0x40..0x44].try_into().unwrap()));
        assert_eq!(block.payload, bytes[..0x80].to_vec());
    }

    #[test]
    fn test_decode_is_deterministic() {
        let bytes = image_with_header(0x10, &app_header(), 0x100);
        let region = region_with(bytes);

        let first = decode_block(&region, &region, BASE + 0x10).unwrap();
        let second = decode_block(&region, &region, BASE + 0x10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_unknown_code_has_no_label() {
        let fields = HeaderFields {
            identifier_code: 0x77,
            ..app_header()
        };
        let region = region_with(image_with_header(0, &fields, 0x100));

        let block = decode_block(&region, &region, BASE).unwrap();
        assert_eq!(block.identifier_code, 0x77);
        assert_eq!(block.label(), None);
    }

    #[test]
    fn test_decode_payload_past_region_end() {
        let fields = HeaderFields {
            size: 0x101,
            ..app_header()
        };
        let region = region_with(image_with_header(0, &fields, 0x100));

        let err = decode_block(&region, &region, BASE).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedRead { length: 0x101, .. }));
    }

    #[test]
    fn test_decode_header_past_region_end() {
        let region = region_with(vec![0u8; 0x40]);
        let err = decode_block(&region, &region, BASE + 0x20).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedRead { length: HEADER_SIZE, .. }));
    }

    #[test]
    fn test_decode_address_outside_region() {
        let region = region_with(vec![0u8; 0x40]);
        let err = decode_block(&region, &region, 0x8080_0000).unwrap_err();
        assert!(matches!(err, FormatError::RegionBounds { .. }));
    }

    #[test]
    fn test_tables_read_from_separate_region() {
        let fields = HeaderFields {
            table1_pointer: 0x9000_0000,
            table1_count: 1,
            table2_count: 0,
            ..app_header()
        };
        let region = region_with(image_with_header(0, &fields, 0x100));
        let tables = MemoryRegion::new(
            "tables",
            0x9000_0000,
            0,
            4,
            Arc::new(0xCAFE_F00Du32.to_le_bytes().to_vec()),
        )
        .unwrap();

        let block = decode_block(&region, &tables, BASE).unwrap();
        assert_eq!(block.table1, vec![0xCAFE_F00D]);
        assert!(block.table2.is_empty());
    }
}

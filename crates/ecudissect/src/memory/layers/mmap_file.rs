//! Memory-mapped file layer implementation.
//!
//! Maps the dump read-only. The file handle is closed as soon as the mapping
//! exists; the mapping stays valid for the lifetime of the layer.

use crate::memory::error::{DumpError, DumpResult};
use crate::memory::traits::MemoryLayer;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::{Path, PathBuf};

/// A read-only memory-mapped dump file.
///
/// # Example
///
/// ```rust,ignore
/// let layer = MmapFileLayer::open("dump", "stage-1-decoded.bin")?;
/// let header = layer.read_bytes(0x18000, 48)?;
/// ```
pub struct MmapFileLayer {
    /// Layer name.
    name: String,
    /// Path the layer was opened from.
    path: PathBuf,
    /// None for empty files, which cannot be mapped.
    mmap: Option<Mmap>,
}

impl MmapFileLayer {
    /// Open and map a file.
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> DumpResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mmap = {
            let file = File::open(&path)?;
            if file.metadata()?.len() == 0 {
                None
            } else {
                Some(unsafe { MmapOptions::new().map(&file)? })
            }
        };

        Ok(MmapFileLayer {
            name: name.into(),
            path,
            mmap,
        })
    }

    fn as_slice(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Read bytes from the layer. Reads past the end are errors, never padded.
    pub fn read_bytes(&self, offset: u64, length: usize) -> DumpResult<Vec<u8>> {
        let data = self.as_slice();
        let size = data.len() as u64;

        if offset > size || (offset == size && length > 0) {
            return Err(DumpError::invalid_offset(
                &self.name,
                offset,
                "Offset outside of the file boundaries",
            ));
        }

        let start = offset as usize;
        let available = data.len() - start;
        if length > available {
            return Err(DumpError::invalid_offset(
                &self.name,
                offset + available as u64,
                "Could not read sufficient bytes from the file",
            ));
        }

        Ok(data[start..start + length].to_vec())
    }

    /// The path the layer was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemoryLayer for MmapFileLayer {
    fn read(&self, offset: u64, length: usize) -> DumpResult<Vec<u8>> {
        self.read_bytes(offset, length)
    }

    fn is_valid(&self, offset: u64, length: u64) -> bool {
        if length == 0 {
            return false;
        }
        offset
            .checked_add(length)
            .map(|end| end <= self.size())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.as_slice().len() as u64
    }
}

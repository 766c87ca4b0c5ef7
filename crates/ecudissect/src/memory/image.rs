//! Dump image abstraction over a memory layer.

use crate::memory::error::{DumpError, DumpResult};
use crate::memory::layers::MmapFileLayer;
use crate::memory::traits::MemoryLayer;
use blockfmt::MemoryAccess;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A loaded flash dump.
pub struct DumpImage {
    path: PathBuf,
    layer: Arc<dyn MemoryLayer>,
}

impl DumpImage {
    /// Map a dump file.
    pub fn open(path: impl AsRef<Path>) -> DumpResult<Self> {
        let layer = MmapFileLayer::open("dump", path.as_ref())?;
        debug!("Opened layer '{}' ({:#x} bytes)", layer.name(), layer.size());
        let path = layer.path().to_path_buf();
        Ok(DumpImage {
            path,
            layer: Arc::new(layer),
        })
    }

    /// Size of the dump in bytes.
    pub fn size(&self) -> u64 {
        self.layer.size()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail unless the dump is exactly `expected` bytes.
    pub fn expect_size(&self, expected: u64) -> DumpResult<()> {
        let actual = self.size();
        if actual != expected {
            return Err(DumpError::InvalidDumpSize {
                path: self.path.clone(),
                actual,
                expected,
            });
        }
        Ok(())
    }

    /// Shared handle for building regions over this dump.
    pub fn into_source(self) -> Arc<dyn MemoryAccess> {
        Arc::new(self)
    }
}

/// Lets the region map read straight from the dump.
impl MemoryAccess for DumpImage {
    fn read(
        &self,
        offset: u64,
        length: usize,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        self.layer
            .read(offset, length)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }

    fn is_valid(&self, offset: u64, length: u64) -> bool {
        self.layer.is_valid(offset, length)
    }
}

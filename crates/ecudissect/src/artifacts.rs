//! Block payload persistence.
//!
//! Each payload is written to `<identifier code in hex>.bin`. Two blocks with
//! the same identifier code map to the same file; the later one wins.

use crate::memory::error::{DumpError, DumpResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Destination for extracted block payloads.
pub trait ArtifactSink {
    /// Store `bytes` under the name derived from `identifier_code`.
    fn persist(&mut self, identifier_code: u32, bytes: &[u8]) -> DumpResult<PathBuf>;
}

/// File name for a block's payload.
pub fn artifact_name(identifier_code: u32) -> String {
    format!("{:x}.bin", identifier_code)
}

/// Writes payloads into a directory.
#[derive(Debug)]
pub struct ArtifactWriter {
    out_dir: PathBuf,
    /// Codes written during this run, with the number of writes.
    written: HashMap<u32, usize>,
}

impl ArtifactWriter {
    /// Create a writer, creating `out_dir` if needed.
    pub fn new(out_dir: impl Into<PathBuf>) -> DumpResult<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir).map_err(|e| DumpError::artifact(&out_dir, e))?;
        Ok(ArtifactWriter {
            out_dir,
            written: HashMap::new(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Number of distinct files written so far.
    pub fn distinct_artifacts(&self) -> usize {
        self.written.len()
    }
}

impl ArtifactSink for ArtifactWriter {
    fn persist(&mut self, identifier_code: u32, bytes: &[u8]) -> DumpResult<PathBuf> {
        let path = self.out_dir.join(artifact_name(identifier_code));

        let writes = self.written.entry(identifier_code).or_insert(0);
        if *writes > 0 {
            warn!(
                "Block identifier {:#x} seen again; overwriting {}",
                identifier_code,
                path.display()
            );
        }
        *writes += 1;

        fs::write(&path, bytes).map_err(|e| DumpError::artifact(&path, e))?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

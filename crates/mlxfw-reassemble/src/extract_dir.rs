//! Access to an extract directory.

use std::path::{Path, PathBuf};

use mlxfw_image::{FirmwareMetadata, GAPS_DIR, METADATA_FILE, SectionRecord};
use tracing::debug;

use crate::{ReassembleError, Result};

/// An extract directory and its parsed metadata.
#[derive(Clone, Debug)]
pub struct ExtractDir {
    root: PathBuf,
    metadata: FirmwareMetadata,
}

impl ExtractDir {
    /// Open `root` and parse its `firmware_metadata.json`.
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(METADATA_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| ReassembleError::io(&path, e))?;
        let metadata: FirmwareMetadata = serde_json::from_str(&text)
            .map_err(|source| ReassembleError::Json { path: path.clone(), source })?;
        debug!(
            path = %path.display(),
            format = %metadata.format,
            sections = metadata.sections.len(),
            "loaded metadata"
        );
        Ok(Self {
            root: root.to_path_buf(),
            metadata,
        })
    }

    /// Use already-parsed metadata for `root`.
    pub fn with_metadata(root: &Path, metadata: FirmwareMetadata) -> Self {
        Self {
            root: root.to_path_buf(),
            metadata,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn metadata(&self) -> &FirmwareMetadata {
        &self.metadata
    }

    pub fn gaps_dir(&self) -> PathBuf {
        self.root.join(GAPS_DIR)
    }

    /// `<base>.bin` for a section.
    pub fn binary_path(&self, record: &SectionRecord) -> PathBuf {
        self.root.join(format!("{}.bin", record.base_name()))
    }

    /// `<base>.json` for a section.
    pub fn json_path(&self, record: &SectionRecord) -> PathBuf {
        self.root.join(format!("{}.json", record.base_name()))
    }

    pub(crate) fn read(path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| ReassembleError::io(path, e))
    }
}

//! Image reassembler.
//!
//! Rebuilds a byte-exact FS3/FS4/FS5 image from an extract directory:
//! `firmware_metadata.json`, one `.bin` (and optionally `.json`) file per
//! section, and the `gaps/` directory holding everything no section covers.
//!
//! ```ignore
//! use mlxfw_reassemble::{ReassembleOptions, reassemble, write_output};
//!
//! let outcome = reassemble("extracted/".as_ref(), &ReassembleOptions::default().with_verify_crc())?;
//! write_output("fw.bin".as_ref(), &outcome.image)?;
//! ```

mod extract_dir;
mod gaps;
mod options;
mod reassembler;
mod sections;
mod verify;

pub use extract_dir::ExtractDir;
pub use gaps::{GapFile, GapFill, GapPiece, parse_gap_file_name, parse_meta};
pub use options::*;
pub use reassembler::*;
pub use sections::{SectionSource, reconstruct_section};
pub use verify::{image_sha256, verify_sections};

use std::io::Write;
use std::path::{Path, PathBuf};

use mlxfw_crc::CrcError;
use mlxfw_image::ImageError;
use mlxfw_layout::LayoutError;
use thiserror::Error;

/// Reassembly errors.
#[derive(Error, Debug)]
pub enum ReassembleError {
    #[error("no section file for {section}: expected {}", path.display())]
    MissingSectionFile { section: String, path: PathBuf },
    #[error("cannot reconstruct {section}: {reason}")]
    ReconstructionFailed { section: String, reason: String },
    #[error("gap count mismatch: memory layout has {expected} gaps, found files for {found}")]
    GapCountMismatch { expected: usize, found: usize },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{name} at {offset:#x}: {source}")]
    Section {
        name: String,
        offset: u64,
        #[source]
        source: Box<ReassembleError>,
    },
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Crc(#[from] CrcError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl ReassembleError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Innermost error, looking through section context.
    pub fn root(&self) -> &Self {
        match self {
            Self::Section { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReassembleError>;

/// Write `bytes` to `path` atomically.
///
/// The data goes to a temporary file next to `path` that is renamed into
/// place only once fully written; on failure nothing is left behind.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| ReassembleError::io(parent, e))?;
    file.write_all(bytes)
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| ReassembleError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| ReassembleError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests;

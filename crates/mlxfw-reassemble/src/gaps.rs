//! Gap files: bytes of the image that no section covers.
//!
//! Gap `N` is the `N`th gap segment of the memory layout. Its content lives
//! in `gaps/gap_<NNN>[_0x<start>][_...].bin` (verbatim bytes) or `.meta`
//! (a uniform fill described by `size=<N>` and `fill=0x<HH>` lines). A gap
//! split by an interior section has one file per piece, each carrying its
//! own start address.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use mlxfw_image::{GapDescriptor, ImageError, MemorySegment};
use regex::Regex;
use tracing::{debug, warn};

use crate::extract_dir::ExtractDir;
use crate::{ReassembleError, Result};

static GAP_FILE_PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();

fn gap_file_pattern() -> Result<&'static Regex> {
    GAP_FILE_PATTERN
        .get_or_init(|| Regex::new(r"^gap_(\d+)(?:_0x([0-9a-fA-F]+))?(?:_[^.]*)?\.(bin|meta)$"))
        .as_ref()
        .map_err(|e| ImageError::InvalidData(format!("gap file pattern: {e}")).into())
}

/// How a gap piece is stored on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GapFile {
    Binary,
    Meta,
}

/// A parsed gap file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GapPiece {
    pub index: usize,
    /// Start address when the name carries one.
    pub start: Option<u64>,
    pub kind: GapFile,
    pub path: PathBuf,
}

/// Parse `gap_<NNN>[_0x<start>][_...].{bin,meta}`; other names yield `None`.
pub fn parse_gap_file_name(path: &Path) -> Result<Option<GapPiece>> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let Some(caps) = gap_file_pattern()?.captures(name) else {
        return Ok(None);
    };
    let Ok(index) = caps[1].parse::<usize>() else {
        return Ok(None);
    };
    let start = caps
        .get(2)
        .map(|m| u64::from_str_radix(m.as_str(), 16))
        .transpose()
        .map_err(|e| ImageError::InvalidData(format!("gap file {name}: bad start address: {e}")))?;
    let kind = if &caps[3] == "bin" {
        GapFile::Binary
    } else {
        GapFile::Meta
    };
    Ok(Some(GapPiece {
        index,
        start,
        kind,
        path: path.to_path_buf(),
    }))
}

/// Uniform fill read from a `.meta` file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GapFill {
    /// Bytes to fill; `None` fills the rest of the segment.
    pub size: Option<u64>,
    pub fill: u8,
}

fn parse_number(value: &str) -> Option<u64> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")).map_or_else(
        || value.parse().ok(),
        |hex| u64::from_str_radix(hex, 16).ok(),
    )
}

/// Parse `key=value` lines of a `.meta` file.
///
/// Unknown keys, blank lines and `#` comments are ignored. `fill` is
/// required.
pub fn parse_meta(text: &str) -> Result<GapFill> {
    let mut size = None;
    let mut fill = None;
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ImageError::InvalidData(format!("gap meta: malformed line {line:?}")).into());
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "size" => {
                size = Some(value.parse().map_err(|_| {
                    ImageError::InvalidData(format!("gap meta: bad size {value:?}"))
                })?);
            }
            "fill" => {
                fill = Some(
                    parse_number(value)
                        .and_then(|v| u8::try_from(v).ok())
                        .ok_or_else(|| {
                            ImageError::InvalidData(format!("gap meta: bad fill {value:?}"))
                        })?,
                );
            }
            _ => {}
        }
    }
    let fill =
        fill.ok_or_else(|| ImageError::InvalidData("gap meta: no fill line".to_string()))?;
    Ok(GapFill { size, fill })
}

/// All gap pieces on disk, sorted by index, start and name.
pub(crate) fn scan(dir: &Path) -> Result<Vec<GapPiece>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ReassembleError::io(dir, e))?;
    let mut pieces = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReassembleError::io(dir, e))?;
        if let Some(piece) = parse_gap_file_name(&entry.path())? {
            pieces.push(piece);
        }
    }
    pieces.sort_by(|a, b| (a.index, a.start, &a.path).cmp(&(b.index, b.start, &b.path)));
    Ok(pieces)
}

fn range_in(image: &[u8], start: u64, len: usize, what: &str) -> Result<std::ops::Range<usize>> {
    usize::try_from(start)
        .ok()
        .and_then(|s| s.checked_add(len).filter(|&end| end <= image.len()).map(|end| s..end))
        .ok_or_else(|| {
            ImageError::InvalidData(format!(
                "{what}: {len} bytes at {start:#x} overrun the {}-byte image",
                image.len()
            ))
            .into()
        })
}

fn apply_piece(image: &mut [u8], segment: &MemorySegment, piece: &GapPiece) -> Result<()> {
    let start = piece.start.unwrap_or(segment.start);
    let what = piece.path.display().to_string();
    match piece.kind {
        GapFile::Binary => {
            let data = ExtractDir::read(&piece.path)?;
            let range = range_in(image, start, data.len(), &what)?;
            image[range].copy_from_slice(&data);
            debug!(gap = piece.index, start = format_args!("{start:#x}"), len = data.len(), "gap bytes");
            if start + data.len() as u64 > segment.end {
                warn!(gap = piece.index, file = %what, "gap file runs past its segment");
            }
        }
        GapFile::Meta => {
            let text = std::fs::read_to_string(&piece.path)
                .map_err(|e| ReassembleError::io(&piece.path, e))?;
            let fill = parse_meta(&text)?;
            let size = fill.size.unwrap_or_else(|| segment.end.saturating_sub(start));
            let len = usize::try_from(size).map_err(|_| {
                ImageError::InvalidData(format!("{what}: size {size} does not fit"))
            })?;
            let range = range_in(image, start, len, &what)?;
            image[range].fill(fill.fill);
            debug!(
                gap = piece.index,
                start = format_args!("{start:#x}"),
                len,
                fill = format_args!("{:#04x}", fill.fill),
                "gap fill"
            );
        }
    }
    Ok(())
}

/// Fill a gap from the metadata's own descriptor list.
fn apply_descriptor(image: &mut [u8], gap: &GapDescriptor) -> Result<()> {
    let len = usize::try_from(gap.size)
        .map_err(|_| ImageError::InvalidData(format!("gap size {} does not fit", gap.size)))?;
    let Some(fill) = gap.fill else {
        return Err(ReassembleError::ReconstructionFailed {
            section: format!("gap@{:#010x}", gap.start),
            reason: "verbatim gap has no gap file".to_string(),
        });
    };
    let range = range_in(image, gap.start, len, "gap descriptor")?;
    image[range].fill(fill);
    Ok(())
}

/// Lay every gap into `image`. Returns the number of gap pieces applied.
///
/// Without a `gaps/` directory the metadata's gap descriptors are used.
pub(crate) fn restore(dir: &ExtractDir, image: &mut [u8]) -> Result<usize> {
    let metadata = dir.metadata();
    let segments: Vec<&MemorySegment> = metadata.gap_segments().collect();
    let gaps_dir = dir.gaps_dir();

    if !gaps_dir.is_dir() {
        if segments.is_empty() {
            return Ok(0);
        }
        if metadata.gaps.is_empty() {
            return Err(ReassembleError::GapCountMismatch {
                expected: segments.len(),
                found: 0,
            });
        }
        warn!(
            dir = %gaps_dir.display(),
            "no gap files, using gap descriptors from metadata"
        );
        for gap in &metadata.gaps {
            apply_descriptor(image, gap)?;
        }
        return Ok(metadata.gaps.len());
    }

    let pieces = scan(&gaps_dir)?;
    let indices: BTreeSet<usize> = pieces.iter().map(|p| p.index).collect();
    let out_of_range = indices.last().is_some_and(|&last| last >= segments.len());
    if indices.len() != segments.len() || out_of_range {
        return Err(ReassembleError::GapCountMismatch {
            expected: segments.len(),
            found: indices.len(),
        });
    }

    for piece in &pieces {
        apply_piece(image, segments[piece.index], piece)?;
    }
    Ok(pieces.len())
}

//! Reassembly pipeline: magic, HW pointers, gaps, sections, TOC headers,
//! HW pointer CRCs, then optional checks.

use std::path::Path;

use mlxfw_crc::CrcError;
use mlxfw_image::{
    ERASED_BYTE, FirmwareFormat, HW_POINTERS_SIZE, ImageError, MagicPattern, TocHeader, TocInfo,
    TocKind,
};
use tracing::{debug, info, warn};

use crate::extract_dir::ExtractDir;
use crate::options::ReassembleOptions;
use crate::sections::{SectionSource, reconstruct_section};
use crate::verify::{image_sha256, verify_sections};
use crate::{ReassembleError, Result, gaps};

/// Result of a reassembly.
#[derive(Clone, Debug)]
pub struct ReassembleOutcome {
    pub image: Vec<u8>,
    /// `None` when the check was skipped or no hash was recorded.
    pub sha256_match: Option<bool>,
    pub crc_mismatches: Vec<CrcError>,
    pub sections_from_json: usize,
    pub sections_from_binary: usize,
}

/// Reassemble the image described by the extract directory `dir`.
pub fn reassemble(dir: &Path, opts: &ReassembleOptions) -> Result<ReassembleOutcome> {
    Reassembler::new(ExtractDir::open(dir)?, opts.clone()).run()
}

/// Builds one image from one extract directory.
pub struct Reassembler {
    dir: ExtractDir,
    opts: ReassembleOptions,
}

fn span(image: &[u8], offset: u64, len: usize, what: &str) -> Result<std::ops::Range<usize>> {
    usize::try_from(offset)
        .ok()
        .and_then(|start| start.checked_add(len).map(|end| start..end))
        .filter(|range| range.end <= image.len())
        .ok_or_else(|| {
            ImageError::DataTooShort {
                expected: usize::try_from(offset).unwrap_or(usize::MAX).saturating_add(len),
                actual: image.len(),
                context: what.to_string(),
            }
            .into()
        })
}

impl Reassembler {
    pub const fn new(dir: ExtractDir, opts: ReassembleOptions) -> Self {
        Self { dir, opts }
    }

    pub const fn extract_dir(&self) -> &ExtractDir {
        &self.dir
    }

    fn allocate(&self) -> Result<Vec<u8>> {
        let size = self.dir.metadata().original_size;
        if size > self.opts.size_limit {
            return Err(ImageError::FileTooLarge {
                size,
                limit: self.opts.size_limit,
            }
            .into());
        }
        let size = usize::try_from(size).map_err(|_| ImageError::FileTooLarge {
            size,
            limit: self.opts.size_limit,
        })?;
        Ok(vec![ERASED_BYTE; size])
    }

    fn write_magic(&self, image: &mut [u8]) -> Result<()> {
        let metadata = self.dir.metadata();
        if !metadata.format.has_magic_pattern() {
            return Ok(());
        }
        let offset = metadata.magic_pattern.as_ref().map_or(0, |m| m.offset);
        let bytes = mlxfw_layout::encode(&MagicPattern::new())?;
        let range = span(image, offset, bytes.len(), "magic pattern")?;
        image[range].copy_from_slice(&bytes);
        debug!(offset = format_args!("{offset:#x}"), "magic pattern");
        Ok(())
    }

    fn write_hw_pointers(&self, image: &mut [u8]) -> Result<()> {
        let metadata = self.dir.metadata();
        let Some(info) = &metadata.hw_pointers else {
            return Ok(());
        };
        if metadata.format == FirmwareFormat::Fs3 {
            warn!("HW pointers recorded for an FS3 image, ignoring");
            return Ok(());
        }
        let bytes = info.block.encode()?;
        let range = span(image, info.offset, bytes.len(), "HW pointers")?;
        image[range].copy_from_slice(&bytes);
        debug!(offset = format_args!("{:#x}", info.offset), "HW pointers");
        Ok(())
    }

    fn write_sections(&self, image: &mut [u8]) -> Result<(usize, usize)> {
        let (mut json, mut binary) = (0, 0);
        for record in &self.dir.metadata().sections {
            if record.size == 0 {
                continue;
            }
            let name = record.display_name();
            let wrap = |source: ReassembleError| ReassembleError::Section {
                name: name.clone(),
                offset: record.offset,
                source: Box::new(source),
            };
            let (bytes, source) =
                reconstruct_section(&self.dir, record, self.opts.binary_only).map_err(wrap)?;
            let range = span(image, record.offset, bytes.len(), &name).map_err(wrap)?;
            image[range].copy_from_slice(&bytes);
            match source {
                SectionSource::Json => json += 1,
                SectionSource::Binary => binary += 1,
            }
            debug!(
                section = %name,
                offset = format_args!("{:#x}", record.offset),
                len = bytes.len(),
                ?source,
                "section"
            );
        }
        Ok((json, binary))
    }

    fn write_toc(image: &mut [u8], toc: &TocInfo, kind: TocKind) -> Result<()> {
        let data = &toc.header_data;
        let range = span(image, toc.address, data.len(), kind.name())?;
        image[range].copy_from_slice(data);
        match TocHeader::decode(data) {
            Ok(header) if header.kind() == Some(kind) => {}
            Ok(header) => warn!(
                toc = kind.name(),
                signature = format_args!("{:#010x}", header.signature0),
                "unexpected TOC signature"
            ),
            Err(error) => warn!(toc = kind.name(), %error, "undecodable TOC header"),
        }
        debug!(toc = kind.name(), address = format_args!("{:#x}", toc.address), "TOC header");
        Ok(())
    }

    fn fix_hw_pointer_crcs(&self, image: &mut [u8]) -> Result<()> {
        let Some(info) = &self.dir.metadata().hw_pointers else {
            return Ok(());
        };
        let range = span(image, info.offset, HW_POINTERS_SIZE, "HW pointers")?;
        let fixed = mlxfw_crc::fix_hw_pointer_crcs(&mut image[range])?;
        debug!(entries = fixed, "HW pointer CRCs");
        Ok(())
    }

    /// Build the image.
    pub fn run(&self) -> Result<ReassembleOutcome> {
        let metadata = self.dir.metadata();
        info!(
            dir = %self.dir.root().display(),
            format = %metadata.format,
            size = metadata.original_size,
            "reassembling"
        );

        let mut image = self.allocate()?;
        self.write_magic(&mut image)?;
        self.write_hw_pointers(&mut image)?;
        let gap_pieces = gaps::restore(&self.dir, &mut image)?;
        let (sections_from_json, sections_from_binary) = self.write_sections(&mut image)?;
        if let Some(itoc) = &metadata.itoc {
            Self::write_toc(&mut image, itoc, TocKind::Itoc)?;
        }
        if let Some(dtoc) = &metadata.dtoc {
            Self::write_toc(&mut image, dtoc, TocKind::Dtoc)?;
        }
        if metadata.format != FirmwareFormat::Fs3 {
            self.fix_hw_pointer_crcs(&mut image)?;
        }

        let crc_mismatches = if self.opts.verify_crc {
            verify_sections(&metadata.sections, &image, metadata.is_encrypted)
        } else {
            Vec::new()
        };
        if self.opts.strict_crc {
            if let Some(first) = crc_mismatches.first() {
                return Err(first.clone().into());
            }
        }

        let sha256_match = (self.opts.verify_sha256 && !metadata.sha256.is_empty()).then(|| {
            let actual = image_sha256(&image);
            let matched = actual.eq_ignore_ascii_case(&metadata.sha256);
            if !matched {
                warn!(expected = %metadata.sha256, %actual, "SHA-256 mismatch");
            }
            matched
        });

        info!(
            sections = sections_from_json + sections_from_binary,
            from_json = sections_from_json,
            gaps = gap_pieces,
            crc_mismatches = crc_mismatches.len(),
            "reassembled"
        );
        Ok(ReassembleOutcome {
            image,
            sha256_match,
            crc_mismatches,
            sections_from_json,
            sections_from_binary,
        })
    }
}

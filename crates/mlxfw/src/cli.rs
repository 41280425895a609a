//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mlxfw::Checksum;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "mlxfw")]
#[command(about = "Mellanox FS3/FS4/FS5 firmware image tool")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild a firmware image from an extract directory
    Reassemble {
        /// Extract directory (holds firmware_metadata.json)
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Output image
        #[arg(short, long)]
        output: PathBuf,

        /// Recompute section CRCs on the rebuilt image
        #[arg(long)]
        verify_crc: bool,

        /// Fail on CRC mismatches (implies --verify-crc)
        #[arg(long)]
        strict_crc: bool,

        /// Ignore JSON sidecars and use the .bin files
        #[arg(long)]
        binary_only: bool,

        /// Skip the SHA-256 comparison with the metadata
        #[arg(long)]
        no_verify_sha256: bool,
    },
    /// Compute a CRC16 over a file
    Crc {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// CRC algorithm
        #[arg(long, value_enum, default_value = "image")]
        algorithm: ChecksumArg,

        /// Start offset (decimal or 0x-prefixed hex)
        #[arg(long, default_value = "0", value_parser = parse_number)]
        offset: usize,

        /// Byte count; 0 runs to the end of the file
        #[arg(long, default_value = "0", value_parser = parse_number)]
        length: usize,
    },
    /// Decode a section binary into its JSON document
    Decode {
        /// Section binary
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Section type name (e.g. IMAGE_INFO, DEV_INFO, 0xe0)
        #[arg(long = "type", value_name = "SECTION")]
        section_type: String,
    },
    /// Verify the CRC of a BOOT2 blob
    Boot2 {
        /// File holding BOOT2
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Offset of BOOT2 within the file
        #[arg(long, default_value = "0", value_parser = parse_number)]
        offset: usize,
    },
    /// Summarize an extract directory
    Info {
        /// Extract directory (holds firmware_metadata.json)
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    /// Decode one section of an extract directory into JSON
    Section {
        /// Extract directory (holds firmware_metadata.json)
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Section type name (e.g. IMAGE_INFO, DEV_INFO, 0xe0)
        #[arg(long = "type", value_name = "SECTION")]
        section_type: String,

        /// Section offset in the image
        #[arg(long, value_parser = parse_offset)]
        offset: u64,
    },
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ChecksumArg {
    /// Software CRC16 over host-order dwords
    Software,
    /// Software CRC16 over big-endian dwords
    #[default]
    Image,
    /// HW pointer CRC
    Hardware,
}

impl From<ChecksumArg> for Checksum {
    fn from(arg: ChecksumArg) -> Self {
        match arg {
            ChecksumArg::Software => Self::Software,
            ChecksumArg::Image => Self::Image,
            ChecksumArg::Hardware => Self::Hardware,
        }
    }
}

/// Parse an image offset, decimal or `0x`-prefixed hex.
pub fn parse_offset(s: &str) -> Result<u64, String> {
    parse_number(s).and_then(|n| u64::try_from(n).map_err(|e| e.to_string()))
}

/// Parse a decimal or `0x`-prefixed hex number.
pub fn parse_number(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

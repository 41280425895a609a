//! Extract directory inspection commands.

use std::path::Path;

use mlxfw::SectionType;
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Handle the `info` command.
pub fn cmd_info(dir: &Path) -> i32 {
    let summary = match mlxfw::summarize(dir) {
        Ok(summary) => summary,
        Err(e) => {
            error!(dir = %dir.display(), error = %e, "cannot read extract directory");
            return EXIT_FAILURE;
        }
    };
    println!("format:     {}", summary.format);
    println!("size:       {:#x}", summary.original_size);
    println!("encrypted:  {}", summary.is_encrypted);
    println!("sections:   {}", summary.sections);
    println!("gaps:       {}", summary.gaps);
    match &summary.fw_version {
        Some(version) => println!("fw version: {version}"),
        None => terminal::dim("no IMAGE_INFO binary"),
    }
    EXIT_SUCCESS
}

/// Handle the `section` command. Prints the JSON document on stdout.
pub fn cmd_section(dir: &Path, type_name: &str, offset: u64) -> i32 {
    let Some(section_type) = SectionType::from_name(type_name) else {
        error!(section = type_name, "unknown section type");
        return EXIT_FAILURE;
    };
    match mlxfw::decode_extracted(dir, section_type, offset) {
        Ok(json) => {
            println!("{json}");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(dir = %dir.display(), section = %section_type, error = %e, "decode failed");
            EXIT_FAILURE
        }
    }
}

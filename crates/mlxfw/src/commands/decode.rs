//! Decode command.

use std::path::Path;

use mlxfw::SectionType;
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `decode` command. Prints the JSON document on stdout.
pub fn cmd_decode(file: &Path, type_name: &str) -> i32 {
    let Some(section_type) = SectionType::from_name(type_name) else {
        error!(section = type_name, "unknown section type");
        return EXIT_FAILURE;
    };
    let result =
        mlxfw::read_file(file).and_then(|data| mlxfw::decode_section(section_type, &data));
    match result {
        Ok(json) => {
            println!("{json}");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(file = %file.display(), section = %section_type, error = %e, "decode failed");
            EXIT_FAILURE
        }
    }
}

//! CRC command.

use std::path::Path;

use mlxfw::Checksum;
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `crc` command. Prints the CRC as `0xXXXX` on stdout.
pub fn cmd_crc(file: &Path, kind: Checksum, offset: usize, length: usize) -> i32 {
    let result =
        mlxfw::read_file(file).and_then(|data| mlxfw::checksum(kind, &data, offset, length));
    match result {
        Ok(crc) => {
            println!("{crc:#06x}");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(file = %file.display(), error = %e, "CRC failed");
            EXIT_FAILURE
        }
    }
}

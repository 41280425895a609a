//! BOOT2 verification command.

use std::path::Path;

use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal;

/// Handle the `boot2` command.
pub fn cmd_boot2(file: &Path, offset: usize, quiet: bool) -> i32 {
    let result = mlxfw::read_file(file).and_then(|data| mlxfw::verify_boot2_at(&data, offset));
    match result {
        Ok(crc) => {
            if !quiet {
                terminal::success(&format!("BOOT2 at {offset:#x}: CRC {crc:#06x} OK"));
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(file = %file.display(), error = %e, "BOOT2 verification failed");
            terminal::error(&format!("BOOT2 at {offset:#x}: {e}"));
            EXIT_FAILURE
        }
    }
}

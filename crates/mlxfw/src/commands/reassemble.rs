//! Reassemble command.

use std::path::Path;

use mlxfw::ReassembleOptions;
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::terminal::{self, Spinner};

/// Handle the `reassemble` command.
pub fn cmd_reassemble(dir: &Path, output: &Path, opts: &ReassembleOptions, quiet: bool) -> i32 {
    info!(dir = %dir.display(), output = %output.display(), "reassembling");
    let spinner = Spinner::new(format!("Reassembling {}", dir.display()), quiet);

    let outcome = match mlxfw::reassemble(dir, opts) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "reassembly failed");
            spinner.finish_with_failure(&format!("Reassembly failed: {e}"));
            return EXIT_FAILURE;
        }
    };
    if let Err(e) = mlxfw::write_output(output, &outcome.image) {
        error!(error = %e, "write failed");
        spinner.finish_with_failure(&format!("Cannot write {}: {e}", output.display()));
        return EXIT_FAILURE;
    }

    let summary = format!(
        "Wrote {} ({} bytes, {} sections from JSON, {} from binary)",
        output.display(),
        outcome.image.len(),
        outcome.sections_from_json,
        outcome.sections_from_binary
    );
    if outcome.sha256_match == Some(false) || !outcome.crc_mismatches.is_empty() {
        spinner.finish_with_warning(&summary);
    } else {
        spinner.finish_with_success(&summary);
    }
    if !quiet {
        match outcome.sha256_match {
            Some(true) => terminal::dim("SHA-256 matches the original image"),
            Some(false) => terminal::warning("SHA-256 differs from the original image"),
            None => {}
        }
        for mismatch in &outcome.crc_mismatches {
            terminal::warning(&mismatch.to_string());
        }
    }
    EXIT_SUCCESS
}

//! Command implementations.
//!
//! Each submodule handles one CLI command.

mod boot2;
mod crc;
mod decode;
mod info;
mod reassemble;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Reassemble {
            dir,
            output,
            verify_crc,
            strict_crc,
            binary_only,
            no_verify_sha256,
        } => {
            let mut opts = mlxfw::ReassembleOptions::default().with_verify_sha256(!no_verify_sha256);
            if *binary_only {
                opts = opts.with_binary_only();
            }
            if *verify_crc {
                opts = opts.with_verify_crc();
            }
            if *strict_crc {
                opts = opts.with_strict_crc();
            }
            reassemble::cmd_reassemble(dir, output, &opts, cli.silent)
        }
        Commands::Crc {
            file,
            algorithm,
            offset,
            length,
        } => crc::cmd_crc(file, (*algorithm).into(), *offset, *length),
        Commands::Decode { file, section_type } => decode::cmd_decode(file, section_type),
        Commands::Boot2 { file, offset } => boot2::cmd_boot2(file, *offset, cli.silent),
        Commands::Info { dir } => info::cmd_info(dir),
        Commands::Section {
            dir,
            section_type,
            offset,
        } => info::cmd_section(dir, section_type, *offset),
    }
}

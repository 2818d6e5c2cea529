//! CLI entrypoint for the dcslink simulator client.
//!
//! The binary delegates to [`dcslink_cli::run`], which loads configuration,
//! parses the subcommand, and talks to the export script.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handles: the receive thread logs to stderr while the main
    // thread writes results.
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    dcslink_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}

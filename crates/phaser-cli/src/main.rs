//! Entry point for `phaserctl`.
//!
//! Delegates to [`phaser_cli::run`], which loads configuration, connects to
//! the phaser server and runs one command.

use std::io::{self, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    // Stderr stays unlocked: the reader thread logs to it while commands wait.
    let mut stderr = io::stderr();
    phaser_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}

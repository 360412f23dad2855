//! Command-line argument definitions for `phaserctl`.

use clap::{Args, Parser, Subcommand};
use phaser_client::{JobInput, ResultId};

/// Command-line interface for the phaser control-room client.
#[derive(Parser, Debug)]
#[command(
    name = "phaserctl",
    about = "Drive a phaser server from the command line",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// The operation to run against the server.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// One command sent through the console.
    #[command(flatten)]
    Console(ConsoleCommand),
    /// Prints notifications until the server closes the connection.
    Watch,
}

/// Commands that run one console operation and exit.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    /// Prints the server version.
    Version,
    /// Lists the cavities the server can phase.
    Cavities,
    /// Starts a phasing job.
    Start(StartArgs),
    /// Pauses the running job.
    Pause,
    /// Resumes the paused job.
    Resume,
    /// Stops the running job.
    Stop,
    /// Skips the cavity currently being phased.
    Skip,
    /// Applies the corrections recorded in stored results.
    ApplyCorrections {
        /// Result identifiers whose corrections are applied.
        #[arg(value_name = "RESULT_ID", required = true, num_args = 1..)]
        results: Vec<ResultId>,
    },
}

/// Job parameters for `phaserctl start`.
///
/// Numeric fields are taken as text and validated together, so every
/// rejection names the offending field the same way.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct StartArgs {
    /// Apply corrections rather than only measuring.
    #[arg(long)]
    pub(crate) correct: bool,
    /// Loop over the cavities until stopped.
    #[arg(long)]
    pub(crate) continuous: bool,
    /// Largest acceptable phase error, in degrees.
    #[arg(long, value_name = "DEGREES")]
    pub(crate) max_phase_error: String,
    /// Largest acceptable momentum error, as a fraction.
    #[arg(long, value_name = "FRACTION")]
    pub(crate) max_momentum_error: String,
    /// Samples taken per kick.
    #[arg(long, value_name = "COUNT")]
    pub(crate) kick_samples: String,
    /// Phase every cavity the server lists, in server order.
    #[arg(long, conflicts_with = "cavities")]
    pub(crate) all_cavities: bool,
    /// Cavities to phase, in execution order.
    #[arg(value_name = "CAVITY")]
    pub(crate) cavities: Vec<String>,
}

impl StartArgs {
    /// Builds the raw job input for the given cavity selection.
    pub(crate) fn into_input(self, cavities: Vec<String>) -> JobInput {
        JobInput {
            correct: self.correct,
            continuous: self.continuous,
            max_phase_error: self.max_phase_error,
            max_momentum_error: self.max_momentum_error,
            kick_samples: self.kick_samples,
            cavities,
        }
    }
}

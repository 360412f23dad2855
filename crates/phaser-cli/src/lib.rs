//! Command-line front end for the phaser control-room client.
//!
//! `phaserctl [config flags] <command>` loads layered configuration, opens a
//! session with the phaser server, runs one console operation and prints
//! its result. `watch` instead prints every notification until the server
//! closes the connection. The runtime takes its argument list and output
//! streams as parameters so tests can drive it in-process.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use phaser_client::{CavityCache, CommandConsole, JobSpecification, Session, SessionSettings};
use tracing::debug;

mod cli;
mod config;
mod errors;
pub mod telemetry;
mod watch;

use cli::{Cli, CliCommand, ConsoleCommand, StartArgs};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use config::split_config_arguments;
pub(crate) use errors::AppError;

/// Tracing target for CLI events.
pub(crate) const CLI_TARGET: &str = "phaser_cli";

/// Exit status for command-line usage errors.
const USAGE_EXIT_CODE: u8 = 2;

/// Runs the CLI using the provided arguments and output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    let result = loader.load(&split.config_arguments).and_then(|config| {
        telemetry::initialise(&config)?;
        execute(cli.command, &SessionSettings::from(&config), stdout)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

/// Writes clap's help, version or usage error to the stream clap expects.
fn report_usage<W: Write, E: Write>(
    usage: &clap::Error,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    if usage.use_stderr() {
        let _ = write!(stderr, "{}", usage.render());
        ExitCode::from(USAGE_EXIT_CODE)
    } else {
        let _ = write!(stdout, "{}", usage.render());
        ExitCode::SUCCESS
    }
}

fn execute<W: Write>(
    command: CliCommand,
    settings: &SessionSettings,
    stdout: &mut W,
) -> Result<(), AppError> {
    let command = match command {
        CliCommand::Watch => return watch::run(settings, stdout),
        CliCommand::Console(command) => command,
    };

    let session = Session::open(settings, Vec::new())?;
    let outcome = run_console_command(command, &session, stdout);
    let exit = session.close();
    debug!(target: CLI_TARGET, reader = ?exit, "session closed");
    outcome
}

fn run_console_command<W: Write>(
    command: ConsoleCommand,
    session: &Session,
    stdout: &mut W,
) -> Result<(), AppError> {
    let console = session.console();
    match command {
        ConsoleCommand::Version => {
            writeln!(stdout, "{}", console.server_version()?)?;
        }
        ConsoleCommand::Cavities => {
            for name in console.cavities()? {
                writeln!(stdout, "{name}")?;
            }
        }
        ConsoleCommand::Start(args) => {
            let job = job_from_args(args, session.cavities())?;
            console.start(&job)?;
            writeln!(stdout, "started job on {} cavities", job.cavities().len())?;
        }
        ConsoleCommand::Pause => {
            console.pause()?;
            acknowledge(stdout, "pause")?;
        }
        ConsoleCommand::Resume => {
            console.resume()?;
            acknowledge(stdout, "resume")?;
        }
        ConsoleCommand::Stop => {
            console.stop()?;
            acknowledge(stdout, "stop")?;
        }
        ConsoleCommand::Skip => {
            console.skip()?;
            acknowledge(stdout, "skip")?;
        }
        ConsoleCommand::ApplyCorrections { results } => {
            console.apply_corrections(&results)?;
            writeln!(stdout, "applied corrections from {} results", results.len())?;
        }
    }
    Ok(())
}

fn acknowledge<W: Write>(stdout: &mut W, command: &str) -> Result<(), AppError> {
    writeln!(stdout, "{command}: ok")?;
    Ok(())
}

/// Validates job arguments against the cavities the server reported.
fn job_from_args(mut args: StartArgs, known: &CavityCache) -> Result<JobSpecification, AppError> {
    let cavities: Vec<String> = if args.all_cavities {
        known.snapshot().into_iter().collect()
    } else {
        std::mem::take(&mut args.cavities)
    };
    if let Some(name) = cavities.iter().find(|name| !known.contains(name)) {
        return Err(AppError::UnknownCavity { name: name.clone() });
    }
    Ok(JobSpecification::try_from(args.into_input(cavities))?)
}

#[cfg(test)]
mod tests;

//! Configuration loading for `phaserctl`.
//!
//! Configuration flags come first on the command line. They are split off
//! and handed to `ortho_config`, while the remaining tokens are parsed as
//! the command.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use phaser_config::Config;

use crate::AppError;

/// CLI flags recognised by the configuration loader.
///
/// Kept in sync with the fields of [`Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--server-host",
    "--server-port",
    "--connect-timeout-secs",
    "--response-timeout-secs",
    "--max-frame-length",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the program name plus configuration flags.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

/// Layers defaults, file, environment and flags through `ortho_config`.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments separated into configuration and command halves.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    /// Program name followed by the configuration flags.
    pub(crate) config_arguments: Vec<OsString>,
    /// Program name followed by the command tokens.
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut command_arguments = vec![program.clone()];
    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value && let Some(value) = remaining.next() {
                    config_arguments.push(value.clone());
                }
            }
            FlagAction::Stop => {
                command_arguments.push(argument.clone());
                command_arguments.extend(remaining.cloned());
                break;
            }
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--server-port", FlagAction::Include { needs_value: true })]
    #[case("pause", FlagAction::Stop)]
    #[case("--unknown", FlagAction::Stop)]
    fn classifies_arguments(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[rstest]
    fn splits_flags_from_command() {
        let split = split_config_arguments(&os(&[
            "phaserctl",
            "--server-host",
            "phaser.example",
            "--log-format=json",
            "start",
            "--kick-samples",
            "32",
        ]));

        assert_eq!(
            split.config_arguments,
            os(&["phaserctl", "--server-host", "phaser.example", "--log-format=json"])
        );
        assert_eq!(
            split.command_arguments,
            os(&["phaserctl", "start", "--kick-samples", "32"])
        );
    }

    #[rstest]
    fn flags_after_the_command_belong_to_it() {
        let split = split_config_arguments(&os(&["phaserctl", "pause", "--server-port", "1"]));

        assert_eq!(split.config_arguments, os(&["phaserctl"]));
        assert_eq!(
            split.command_arguments,
            os(&["phaserctl", "pause", "--server-port", "1"])
        );
    }

    #[rstest]
    fn empty_arguments_split_to_nothing() {
        assert_eq!(split_config_arguments(&[]), ConfigArgumentSplit::default());
    }
}

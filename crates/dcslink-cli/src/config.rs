//! Configuration loading helpers for the dcslink CLI.
//!
//! Leading configuration flags go to `ortho_config`; everything from the
//! first other token on is parsed as the subcommand.

use std::ffi::{OsStr, OsString};

use dcslink_config::Config;
use ortho_config::OrthoConfig as _;

use crate::AppError;

/// CLI flags recognised by the configuration loader. Keep in sync with the
/// fields of [`Config`].
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--host",
    "--port",
    "--connect-timeout-ms",
    "--poll-interval-ms",
    "--max-frame-bytes",
    "--latin1-fallback",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the leading configuration flags.
    ///
    /// Configuration flags after the subcommand are not seen here.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

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
    let mut parts = text.splitn(2, '=');
    let flag = parts.next().unwrap_or_default();
    let has_inline_value = parts.next().is_some();
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split between the configuration loader and clap.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits `args` (program name first) at the first token that is not a
/// configuration flag or its value. Both halves keep the program name.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut iter = args.iter();
    let Some(program) = iter.next() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut rest = iter.as_slice();
    while let Some((argument, tail)) = rest.split_first() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                rest = tail;
                if needs_value && let Some((value, after)) = rest.split_first() {
                    config_arguments.push(value.clone());
                    rest = after;
                }
            }
            FlagAction::Stop => break,
        }
    }

    let mut command_arguments = vec![program.clone()];
    command_arguments.extend(rest.iter().cloned());
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
    #[case("--port=7800", FlagAction::Include { needs_value: false })]
    #[case("--port", FlagAction::Include { needs_value: true })]
    #[case("object", FlagAction::Stop)]
    #[case("--format", FlagAction::Stop)]
    fn classifies_flags(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[test]
    fn leading_config_flags_go_to_the_loader() {
        let split = split_config_arguments(&os(&[
            "dcslink",
            "--host",
            "10.0.0.5",
            "--log-format=json",
            "object",
            "42",
            "--port",
            "1",
        ]));
        assert_eq!(
            split.config_arguments,
            os(&["dcslink", "--host", "10.0.0.5", "--log-format=json"])
        );
        assert_eq!(
            split.command_arguments,
            os(&["dcslink", "object", "42", "--port", "1"])
        );
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        let split = split_config_arguments(&[]);
        assert!(split.config_arguments.is_empty());
        assert!(split.command_arguments.is_empty());
    }
}

//! Clap adapter for stackfig.
//!
//! This module is the optional integration layer between the
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! It does two jobs:
//!
//! - [`command()`] generates a `clap::Command` with one `--{dotted.path}`
//!   option per schema leaf. Applications extend the returned command with
//!   their own positionals, flags and subcommands before parsing.
//!   [`cli_options()`] reads the parsed matches back into
//!   `(option_id, value)` pairs for [`collect_cli`](crate::overrides::collect_cli).
//! - [`ConfigArgs`] and [`ConfigSubcommand`] give an app a
//!   `config list|get|env|gen` subcommand. [`ConfigArgs::into_action()`]
//!   converts it into a [`ConfigAction`], and from there all logic flows
//!   through the clap-free [`StackfigBuilder::handle()`](crate::StackfigBuilder::handle).
//!
//! Schema options carry no clap default, and only values whose
//! [`ValueSource`] is the command line are collected, so a flag the user did
//! not type never outranks the file or env layers.

use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Args, Command, FromArgMatches, Subcommand};

use crate::flatten::FieldPath;
use crate::overrides::option_id;
use crate::types::ConfigAction;

/// Build the command-line parser for a schema.
///
/// The command is named `app_name` and described as `"{app_name} Configuration"`.
/// Options appear in schema declaration order. Adding an argument whose id or
/// long name collides with a schema option is a programming error that
/// `Command::debug_assert` (and clap's debug builds) report by panicking.
pub fn command(app_name: &str, fields: &[FieldPath]) -> Command {
    fields.iter().fold(
        Command::new(app_name.to_string()).about(format!("{app_name} Configuration")),
        |cmd, field| cmd.arg(schema_arg(field)),
    )
}

fn schema_arg(field: &FieldPath) -> Arg {
    let help = field
        .doc
        .first()
        .cloned()
        .unwrap_or_else(|| format!("Set {}", field.path));
    Arg::new(option_id(&field.path))
        .long(field.path.clone())
        .value_name("VALUE")
        .help(help)
        .action(ArgAction::Set)
        .allow_negative_numbers(true)
}

/// The schema options the user actually typed, as `(option_id, value)` pairs.
///
/// Options that were not passed, or that were filled from anything other
/// than the command line, come back as `None`.
pub fn cli_options(matches: &ArgMatches, fields: &[FieldPath]) -> Vec<(String, Option<String>)> {
    fields
        .iter()
        .map(|field| {
            let id = option_id(&field.path);
            let value = match matches.try_get_one::<String>(&id) {
                Ok(Some(value)) if matches.value_source(&id) == Some(ValueSource::CommandLine) => {
                    Some(value.clone())
                }
                _ => None,
            };
            (id, value)
        })
        .collect()
}

/// Clap-derived args for the `config` subcommand group.
///
/// Embed this into your app's clap derive:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
///
/// Or attach it to a generated [`command()`] with [`ConfigArgs::subcommand()`].
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show every resolved value and the layer it came from.
    List,
    /// Show the resolved value and documentation for a config key.
    Get {
        /// Dotted key path (e.g. "key_02.subkey_01").
        key: String,
    },
    /// Show the CLI flag and environment variable names for every key.
    Env,
    /// Generate a JSON configuration file holding every default.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl ConfigArgs {
    /// A `config` subcommand for builder-style commands.
    pub fn subcommand() -> Command {
        ConfigArgs::augment_args(Command::new("config").about("Inspect the resolved configuration"))
    }

    /// Read `config` subcommand matches back into `ConfigArgs`.
    pub fn from_matches(matches: &ArgMatches) -> Result<ConfigArgs, clap::Error> {
        ConfigArgs::from_arg_matches(matches)
    }

    /// Convert clap-parsed args into a framework-agnostic `ConfigAction`.
    ///
    /// Bare `config` (no subcommand) and explicit `config list` both map to
    /// `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
            Some(ConfigSubcommand::Env) => ConfigAction::Env,
            Some(ConfigSubcommand::Gen { output }) => ConfigAction::Gen { output },
        }
    }
}

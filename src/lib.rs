//! Five-layer configuration resolution for command-line applications.
//!
//! Stackfig resolves every setting of a nested configuration tree from five
//! sources, each addressed by the setting's dotted path:
//!
//! ```ignore
//! let config: AppConfig = Stackfig::builder()
//!     .app_name("app_name")
//!     .parse()?;
//! ```
//!
//! That single call reads `~/.config/app_name/config.json`, looks up
//! `app_name.key_02.subkey_01` and `APP_NAME_KEY_02_SUBKEY_01` in the
//! environment, parses `--key_02.subkey_01` from the command line, fills in
//! the in-code defaults and hands you a typed struct.
//!
//! # Layer precedence
//!
//! ```text
//! Defaults              #[config(default = ...)] or Schema::builder()
//!        ↑ overridden by
//! Config file           ~/.config/{app_name}/config.json
//!        ↑ overridden by
//! Lowercase env         {app_name}.key_02.subkey_01
//!        ↑ overridden by
//! Uppercase env         {APP_NAME}_KEY_02_SUBKEY_01
//!        ↑ overridden by
//! Command line          --key_02.subkey_01
//! ```
//!
//! Every layer is **sparse**. A layer only has an opinion about the paths it
//! actually supplies; everything else falls through to the layer below.
//! Precedence is decided per leaf, never per group, so a file that sets
//! `key_02.subkey_02` and an env var that sets `key_02.subkey_01` both take
//! effect.
//!
//! # Declaring the schema
//!
//! The tree of groups and leaves is the single source of truth. Either derive
//! [`confique::Config`] on a struct:
//!
//! ```ignore
//! #[derive(Config, Deserialize, Serialize)]
//! struct AppConfig {
//!     /// Listen port.
//!     #[config(default = 8080)]
//!     port: u16,
//!     #[config(nested)]
//!     database: DbConfig,
//! }
//! ```
//!
//! or describe it by hand with [`Schema::builder()`] and resolve into any
//! `Deserialize` type, `serde_json::Value` included. Every leaf needs a
//! default; leaves are strings, integers, floats or booleans.
//!
//! # Types across sources
//!
//! Environment and command-line values arrive as text and are converted to
//! the leaf's declared type: `true`/`false`/`1`/`0` (any case) for booleans,
//! decimal numbers for integers and floats. A value that does not convert
//! fails the load with the dotted path, the raw value and the layer it came
//! from. File values keep their JSON type and are checked the same way.
//!
//! # Config files
//!
//! The file is a JSON object mirroring the tree. [`search_paths()`](StackfigBuilder::search_paths)
//! and [`search_mode()`](StackfigBuilder::search_mode) control discovery
//! when more than one location should be consulted, and
//! [`config_file()`](StackfigBuilder::config_file) points at a single file.
//! Missing files are silently skipped.
//!
//! Strict mode is **on by default**: a key that is not a leaf of the schema
//! fails the load with the file path, key and line number.
//!
//! ```text
//! Unknown key 'key_02.typo' in /home/user/.config/app_name/config.json (line 4)
//! ```
//!
//! # Command line
//!
//! With the `clap` feature (on by default), [`StackfigBuilder::command()`]
//! returns a `clap::Command` holding one `--{dotted.path}` option per leaf.
//! Extend it with your own arguments and subcommands, parse, and hand the
//! matches back with [`load_from_matches()`](StackfigBuilder::load_from_matches).
//! Without clap, feed the layer through
//! [`cli_override()`](StackfigBuilder::cli_override) or
//! [`cli_args()`](StackfigBuilder::cli_args).
//!
//! # Inspecting the result
//!
//! [`resolve()`](StackfigBuilder::resolve) returns the typed value together
//! with the layer each leaf came from. [`ConfigAction`] drives the
//! `config list|get|env|gen` operations; [`ConfigArgs`] wires them into a
//! clap subcommand.

pub mod error;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod coerce;
mod env;
mod file;
mod flatten;
mod merge;
mod ops;
mod overrides;
mod resolve;
mod schema;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{DEFAULT_FILE_NAME, Stackfig, StackfigBuilder};
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use env::{EnvProvider, ProcessEnv, lower_name, upper_name};
pub use error::{SchemaError, StackfigError};
pub use flatten::{FieldPath, flatten_schema};
pub use merge::{Resolved, ResolvedLeaf};
pub use ops::{ConfigResult, EnvRow, ListEntry, to_json_pretty};
pub use overrides::{ID_SEPARATOR, option_id};
pub use resolve::Resolution;
pub use schema::{LeafType, Node, Schema, SchemaBuilder};
pub use types::{ConfigAction, Layer, RawValue, SearchMode, SearchPath, Sparse};

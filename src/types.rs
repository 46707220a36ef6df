use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

/// One of the five configuration sources, ordered lowest to highest precedence.
///
/// The derived `Ord` is the precedence order: `Default < File < LowerEnv <
/// UpperEnv < Cli`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// In-code defaults from the schema.
    Default,
    /// The JSON configuration file(s).
    File,
    /// `{namespace}.{dotted.path}` environment variables.
    LowerEnv,
    /// `{NAMESPACE}_{DOTTED_PATH}` environment variables.
    UpperEnv,
    /// `--{dotted.path}` command-line options.
    Cli,
}

impl Layer {
    /// All layers in ascending precedence.
    pub const ALL: [Layer; 5] = [
        Layer::Default,
        Layer::File,
        Layer::LowerEnv,
        Layer::UpperEnv,
        Layer::Cli,
    ];
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Default => "default",
            Layer::File => "file",
            Layer::LowerEnv => "lowercase env",
            Layer::UpperEnv => "uppercase env",
            Layer::Cli => "cli",
        };
        f.write_str(name)
    }
}

/// A value as a source supplied it, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Text from an environment variable or a command-line option.
    Text(String),
    /// An already-typed JSON fragment from a config file or the schema defaults.
    Json(Value),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{s:?}"),
            RawValue::Json(v) => write!(f, "{v}"),
        }
    }
}

/// The paths one layer actually supplies. Absent keys mean "no opinion".
pub type Sparse = BTreeMap<String, RawValue>;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (`~/.config/{app}` on Linux, `~/Library/Application Support/{app}` on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// What to do when more than one search path holds a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Every found file contributes; later (higher-priority) files win per leaf.
    #[default]
    Merge,
    /// Only the highest-priority file found is read.
    FirstMatch,
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Every resolved leaf with the layer it came from.
    List,
    /// One resolved leaf.
    Get { key: String },
    /// The path / env name / default mapping table.
    Env,
    /// A JSON file holding every default.
    Gen { output: Option<PathBuf> },
}

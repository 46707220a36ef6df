use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use confique::Config;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::env::{EnvProvider, ProcessEnv};
use crate::error::{SchemaError, StackfigError};
use crate::file;
use crate::flatten::flatten_schema;
use crate::ops::{self, ConfigResult};
use crate::overrides;
use crate::resolve::{self, Resolution, ResolveInput};
use crate::schema::Schema;
use crate::types::{ConfigAction, RawValue, SearchMode, SearchPath};

/// Default config file name inside each search directory.
pub const DEFAULT_FILE_NAME: &str = "config.json";

/// Entry point for building a stackfig configuration.
pub struct Stackfig;

impl Stackfig {
    /// Start a builder whose schema comes from `C`'s confique metadata.
    pub fn builder<C: Config>() -> StackfigBuilder<C> {
        StackfigBuilder::new(Schema::from_config::<C>())
    }

    /// Start a builder with an explicitly declared schema. `C` is the type
    /// the assembled value deserializes into (`serde_json::Value` works).
    pub fn from_schema<C>(schema: Schema) -> StackfigBuilder<C> {
        StackfigBuilder::new(Ok(schema))
    }
}

/// Builder for configuring and loading layered configuration.
///
/// Controls three orthogonal axes (see [`types`](crate::types) for the full picture):
///
/// - **Discovery**: [`search_paths()`](Self::search_paths) or
///   [`config_file()`](Self::config_file) — where to look for the config file.
/// - **Resolution**: [`search_mode()`](Self::search_mode) — merge all or pick one.
/// - **Environment**: [`env_namespace()`](Self::env_namespace) and
///   [`env_source()`](Self::env_source) — which names to read, and from where.
pub struct StackfigBuilder<C> {
    schema: Result<Schema, SchemaError>,
    app_name: Option<String>,
    file_name: Option<String>,
    search_paths: Option<Vec<SearchPath>>,
    config_file: Option<PathBuf>,
    search_mode: SearchMode,
    env_namespace: Option<String>,
    env_enabled: bool,
    env_source: Box<dyn EnvProvider>,
    strict: bool,
    cli_overrides: Vec<(String, RawValue)>,
    _phantom: PhantomData<C>,
}

impl<C> fmt::Debug for StackfigBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackfigBuilder")
            .field("app_name", &self.app_name)
            .field("file_name", &self.file_name)
            .field("search_paths", &self.search_paths)
            .field("config_file", &self.config_file)
            .field("search_mode", &self.search_mode)
            .field("env_namespace", &self.env_namespace)
            .field("env_enabled", &self.env_enabled)
            .field("strict", &self.strict)
            .field("cli_overrides", &self.cli_overrides)
            .finish_non_exhaustive()
    }
}

impl<C> StackfigBuilder<C> {
    fn new(schema: Result<Schema, SchemaError>) -> Self {
        Self {
            schema,
            app_name: None,
            file_name: None,
            search_paths: None,
            config_file: None,
            search_mode: SearchMode::default(),
            env_namespace: None,
            env_enabled: true,
            env_source: Box::new(ProcessEnv),
            strict: true,
            cli_overrides: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Set the application name. This derives sensible defaults:
    /// - `search_paths` → `[SearchPath::Platform]`, i.e. `~/.config/{app_name}/`
    /// - `env_namespace` → `app_name`
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the env namespace (default: `app_name`).
    pub fn env_namespace(mut self, namespace: &str) -> Self {
        self.env_namespace = Some(namespace.to_string());
        self
    }

    /// Disable both environment layers.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Read environment values from `source` instead of the process environment.
    pub fn env_source(mut self, source: impl EnvProvider + 'static) -> Self {
        self.env_source = Box::new(source);
        self
    }

    /// Override the config file name (default: `"config.json"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Replace the default search paths entirely.
    ///
    /// Paths are listed in **priority-ascending** order: the last entry has the
    /// highest priority. See [`SearchPath`] for the available variants.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    /// If no paths have been set yet, starts from the default `[Platform]`.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(|| vec![SearchPath::Platform])
            .push(path);
        self
    }

    /// Read exactly this file for the File layer, ignoring the search paths.
    /// A missing file still yields an empty layer.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Set the search mode (default: [`SearchMode::Merge`]).
    ///
    /// - [`Merge`](SearchMode::Merge): all found config files contribute,
    ///   later (higher-priority) files overriding earlier ones per leaf.
    /// - [`FirstMatch`](SearchMode::FirstMatch): only the single highest-priority
    ///   config file found is used.
    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Add a CLI-layer override for a dotted path. `None` values are ignored
    /// (useful for optional clap args).
    pub fn cli_override<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.cli_overrides
                .push((key.to_string(), RawValue::Text(v.to_string())));
        }
        self
    }

    /// Add CLI-layer values as `(option_id, value)` pairs, where the id is the
    /// dotted path with `.` replaced by `__`. `None` values and ids that name
    /// no config key are ignored.
    pub fn cli_args<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        if let Ok(schema) = &self.schema {
            let sparse = overrides::collect_cli(&flatten_schema(schema), options);
            self.cli_overrides.extend(sparse);
        }
        self
    }

    /// Resolve the effective app name, or error if not set.
    fn effective_app_name(&self) -> Result<&str, StackfigError> {
        self.app_name
            .as_deref()
            .ok_or(StackfigError::AppNameRequired)
    }

    fn effective_file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        self.search_paths
            .clone()
            .unwrap_or_else(|| vec![SearchPath::Platform])
    }

    /// Resolve the effective env namespace (None if env disabled).
    fn effective_env_namespace(&self) -> Result<Option<String>, StackfigError> {
        if !self.env_enabled {
            return Ok(None);
        }
        if let Some(namespace) = &self.env_namespace {
            return Ok(Some(namespace.clone()));
        }
        Ok(Some(self.effective_app_name()?.to_string()))
    }

    fn schema(&self) -> Result<&Schema, StackfigError> {
        self.schema
            .as_ref()
            .map_err(|e| StackfigError::Schema(e.clone()))
    }

    /// Read the config files this builder points at.
    fn load_files(&self) -> Result<Vec<(PathBuf, String)>, StackfigError> {
        let app_name = self.effective_app_name()?;
        if let Some(path) = &self.config_file {
            return Ok(file::read_optional(path)?
                .map(|content| vec![(path.clone(), content)])
                .unwrap_or_default());
        }
        file::load_config_files(
            &self.effective_search_paths(),
            self.effective_file_name(),
            app_name,
            self.search_mode,
        )
    }

    /// Build the `ResolveInput` from current builder state.
    fn build_input(&self) -> Result<ResolveInput<'_>, StackfigError> {
        Ok(ResolveInput {
            files: self.load_files()?,
            strict: self.strict,
            env_namespace: self.effective_env_namespace()?,
            env: self.env_source.as_ref(),
            cli_overrides: self.cli_overrides.clone(),
        })
    }

    /// Handle a `ConfigAction` (list / get / env / gen).
    pub fn handle(self, action: &ConfigAction) -> Result<ConfigResult, StackfigError>
    where
        C: DeserializeOwned,
    {
        let schema = self.schema()?;
        let fields = flatten_schema(schema);
        match action {
            ConfigAction::List => {
                let r = self.resolve_with(schema)?;
                Ok(ops::list_values(&fields, &r.value, &r.resolved))
            }
            ConfigAction::Get { key } => {
                let r = self.resolve_with(schema)?;
                ops::get_value(&fields, &r.value, &r.resolved, key)
            }
            ConfigAction::Env => {
                let namespace = self.effective_env_namespace()?;
                ops::env_table(&fields, namespace.as_deref())
            }
            ConfigAction::Gen { output } => {
                let template = ops::generate_template(schema)?;
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent() {
                            std::fs::create_dir_all(parent).map_err(|e| StackfigError::Io {
                                path: parent.to_path_buf(),
                                source: e,
                            })?;
                        }
                        std::fs::write(path, &template).map_err(|e| StackfigError::Io {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(ConfigResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(ConfigResult::Template(template)),
                }
            }
        }
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(self, action: &ConfigAction) -> Result<(), StackfigError>
    where
        C: DeserializeOwned,
    {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    fn resolve_with(&self, schema: &Schema) -> Result<Resolution<C>, StackfigError>
    where
        C: DeserializeOwned,
    {
        let input = self.build_input()?;
        resolve::resolve(schema, input)
    }

    /// Resolve every layer and keep the provenance of each leaf.
    pub fn resolve(self) -> Result<Resolution<C>, StackfigError>
    where
        C: DeserializeOwned,
    {
        let schema = self.schema()?;
        self.resolve_with(schema)
    }

    /// Load and resolve the configuration through all layers.
    pub fn load(self) -> Result<C, StackfigError>
    where
        C: DeserializeOwned,
    {
        self.resolve().map(|r| r.config)
    }

    /// Pretty-print the resolved configuration as JSON.
    pub fn print_json(self) -> Result<(), StackfigError>
    where
        C: DeserializeOwned + Serialize,
    {
        let config = self.load()?;
        println!("{}", ops::to_json_pretty(&config)?);
        Ok(())
    }
}

#[cfg(feature = "clap")]
impl<C> StackfigBuilder<C> {
    /// The command-line parser for this schema, ready to be extended with the
    /// application's own arguments and subcommands.
    pub fn command(&self) -> Result<clap::Command, StackfigError> {
        let app_name = self.effective_app_name()?;
        Ok(crate::cli::command(app_name, &flatten_schema(self.schema()?)))
    }

    /// Feed the schema options found in `matches` into the CLI layer.
    pub fn cli_matches(self, matches: &clap::ArgMatches) -> Self {
        let options = match &self.schema {
            Ok(schema) => crate::cli::cli_options(matches, &flatten_schema(schema)),
            Err(_) => return self,
        };
        self.cli_args(options)
    }

    /// Load using `matches` (from [`command()`](Self::command)) as the CLI layer.
    pub fn load_from_matches(self, matches: &clap::ArgMatches) -> Result<C, StackfigError>
    where
        C: DeserializeOwned,
    {
        self.cli_matches(matches).load()
    }

    /// Parse the process arguments and load. Exits with a usage message on
    /// command-line errors.
    pub fn parse(self) -> Result<C, StackfigError>
    where
        C: DeserializeOwned,
    {
        let matches = self.command()?.get_matches();
        self.load_from_matches(&matches)
    }
}

//! The settings registry
//!
//! Every tunable option is registered here with a default, then
//! overridden by configuration files and finally by command-line
//! arguments. After startup the registry is frozen into a [`Config`]
//! snapshot that the rest of the pipeline reads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{
    ini::IniDocument,
    merge::{ParsedArguments, convert_raw},
    option::{CliBinding, ConfigOption, OptionSpec},
    paths::ConfigPaths,
    snapshot::Config,
    value::SettingValue,
};
use crate::{
    error::{Error, Result},
    extension::{ExtensionManager, PluginRegistry},
    interfaces::SettingsPlugin,
};

#[derive(Debug, Clone, Default)]
pub struct Settings {
    document: IniDocument,
    all_config_paths: Vec<PathBuf>,
    config_paths: Vec<PathBuf>,
    namespaces: BTreeMap<String, ConfigOption>,
}

impl Settings {
    /// Read configuration from the default search locations
    pub fn new(settings_plugins: &PluginRegistry<dyn SettingsPlugin>) -> Result<Self> {
        Self::from_search_paths(&ConfigPaths::discover(), settings_plugins)
    }

    /// Read configuration from `paths`.
    ///
    /// System files come first, settings plugins may then adjust the list
    /// and the user file is read last.
    pub fn from_search_paths(
        paths: &ConfigPaths,
        settings_plugins: &PluginRegistry<dyn SettingsPlugin>,
    ) -> Result<Self> {
        let mut all_paths = paths.system_paths();

        let manager = ExtensionManager::new(settings_plugins, &Config::default())?;
        manager.map_method("adjust_settings_paths", |plugin| {
            plugin.adjust_settings_paths(&mut all_paths)
        })?;

        paths.ensure_user_file();
        all_paths.push(paths.user_file.clone());

        Self::from_paths(all_paths)
    }

    /// Read configuration from an explicit list of files.
    ///
    /// Missing files are skipped, but at least one must exist.
    pub fn from_paths(all_config_paths: Vec<PathBuf>) -> Result<Self> {
        let mut document = IniDocument::new();
        let config_paths = document.read_files(&all_config_paths)?;
        if config_paths.is_empty() {
            return Err(Error::ConfigFileNotFound(all_config_paths));
        }
        debug!("Read configuration from {:?}", config_paths);

        Ok(Self {
            document,
            all_config_paths,
            config_paths,
            namespaces: BTreeMap::new(),
        })
    }

    /// Read configuration from a single file only
    pub fn with_config_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::from_paths(vec![path.into()])
    }

    /// A registry with no configuration files at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read one more configuration file, overriding what was read so far
    pub fn process_config_path(&mut self, path: &Path) -> Result<()> {
        self.all_config_paths.push(path.to_path_buf());
        if !self.document.read_file(path)? {
            return Err(Error::ConfigFileNotFound(vec![path.to_path_buf()]));
        }
        self.config_paths.push(path.to_path_buf());
        Ok(())
    }

    /// Every path that was considered, in read order
    pub fn all_config_paths(&self) -> &[PathBuf] {
        &self.all_config_paths
    }

    /// The paths that were actually read
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    pub fn document(&self) -> &IniDocument {
        &self.document
    }

    /// Register a new option.
    ///
    /// Registering an existing namespace fails unless `allow_multiple` is
    /// set, in which case only the CLI binding is attached to the existing
    /// option.
    pub fn register_option(&mut self, spec: OptionSpec) -> Result<()> {
        let namespace = spec.namespace();

        if let Some(existing) = self.namespaces.get_mut(&namespace) {
            if !spec.allow_multiple {
                return Err(Error::DuplicatedNamespace {
                    section: spec.section,
                    key: spec.key,
                });
            }
            if let Some(binding) = spec.binding {
                existing.add_binding(binding);
            }
            return Ok(());
        }

        let mut option = ConfigOption::new(namespace.clone(), spec.help, spec.key_type, spec.default);
        if let Some(binding) = spec.binding {
            option.add_binding(binding);
        }
        self.namespaces.insert(namespace, option);
        Ok(())
    }

    /// Bind an already registered option to a command-line parser
    pub fn add_argparser_to_option(
        &mut self,
        namespace: &str,
        binding: CliBinding,
        allow_multiple: bool,
    ) -> Result<()> {
        let option = self
            .namespaces
            .get_mut(namespace)
            .ok_or_else(|| Error::NamespaceNotRegistered(namespace.to_string()))?;

        if !option.bindings().is_empty() && !allow_multiple {
            return Err(Error::ParserAlreadyRegistered(namespace.to_string()));
        }
        option.add_binding(binding);
        Ok(())
    }

    /// Set the current value of an option.
    ///
    /// Unknown namespaces are ignored.
    pub fn update_option(&mut self, namespace: &str, value: SettingValue) -> Result<()> {
        match self.namespaces.get_mut(namespace) {
            Some(option) => {
                option.set_value(value);
            }
            None => debug!("Ignoring update of unregistered namespace {}", namespace),
        }
        Ok(())
    }

    /// Set the current value from a raw string, coerced to the key type
    pub fn update_option_from_str(&mut self, namespace: &str, raw: &str) -> Result<()> {
        let Some(option) = self.namespaces.get_mut(namespace) else {
            debug!("Ignoring update of unregistered namespace {}", namespace);
            return Ok(());
        };
        let value = convert_raw(option, raw)?;
        option.set_value(value);
        Ok(())
    }

    /// Apply every registered key found in the configuration files
    pub fn merge_with_configs(&mut self) -> Result<()> {
        let updates: Vec<(String, String)> = self
            .document
            .sections()
            .flat_map(|section| {
                self.document
                    .items(section)
                    .map(move |(key, raw)| (format!("{section}.{key}"), raw.to_string()))
            })
            .collect();

        for (namespace, raw) in updates {
            self.update_option_from_str(&namespace, &raw)?;
        }
        Ok(())
    }

    /// Apply the command-line values that were actually given
    pub fn merge_with_arguments(&mut self, arguments: &ParsedArguments) -> Result<()> {
        for (namespace, value) in arguments {
            if let Some(value) = value {
                self.update_option(namespace, value.clone())?;
            }
        }
        Ok(())
    }

    pub fn option(&self, namespace: &str) -> Option<&ConfigOption> {
        self.namespaces.get(namespace)
    }

    /// Registered options ordered by namespace
    pub fn options(&self) -> impl Iterator<Item = &ConfigOption> {
        self.namespaces.values()
    }

    /// Options bound to `parser`, with the matching binding
    pub fn bindings_for<'a>(
        &'a self,
        parser: &'a str,
    ) -> impl Iterator<Item = (&'a ConfigOption, &'a CliBinding)> + 'a {
        self.namespaces.values().flat_map(move |option| {
            option
                .bindings()
                .iter()
                .filter(move |binding| binding.parser == parser)
                .map(move |binding| (option, binding))
        })
    }

    /// `namespace -> current value` for every registered option
    pub fn as_dict(&self) -> BTreeMap<String, SettingValue> {
        self.namespaces
            .iter()
            .map(|(namespace, option)| (namespace.clone(), option.value().clone()))
            .collect()
    }

    pub fn as_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.as_dict())?)
    }

    /// Freeze the current values
    pub fn snapshot(&self) -> Config {
        Config::new(self.as_dict())
    }
}

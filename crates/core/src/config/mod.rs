//! Configuration management for quarry
//!
//! Options are registered in [`Settings`] with defaults, merged with INI
//! configuration files and command-line arguments, then frozen into a
//! [`Config`] snapshot.

mod core_options;
pub mod ini;
pub mod merge;
mod option;
pub mod paths;
mod settings;
mod snapshot;
mod value;

// Re-export main types
pub use core_options::{DEFAULT_HINT_FILE, DEFAULT_IDENTIFIER_FORMAT, register_core_options};
pub use ini::IniDocument;
pub use merge::{ParsedArguments, merge_layers};
pub use option::{ArgAction, CliBinding, ConfigOption, Nargs, OptionSpec};
pub use paths::{CONFIG_FILENAME, ConfigPaths, PREFIX_ENV};
pub use settings::Settings;
pub use snapshot::Config;
pub use value::{Converter, KeyType, SettingValue, parse_bool, parse_list};

//! Options owned by the core pipeline

use super::{
    option::OptionSpec,
    settings::Settings,
    value::{KeyType, SettingValue},
};
use crate::error::Result;

/// Default location of the hint file, relative to the working directory
pub const DEFAULT_HINT_FILE: &str = ".quarry.hint";

/// Default template for runnable identifiers
pub const DEFAULT_IDENTIFIER_FORMAT: &str = "{uri}";

fn empty_list() -> SettingValue {
    SettingValue::List(Vec::new())
}

/// Register every option the core reads.
///
/// Command-line bindings are attached later by the front end.
pub fn register_core_options(settings: &mut Settings) -> Result<()> {
    settings.register_option(OptionSpec::new(
        "plugins",
        "disable",
        empty_list(),
        "Fully qualified names of plugins that should not be loaded, such as \"resolver.tap\"",
    ))?;

    for plugin_type in ["resolver", "discoverer", "cli", "cli.cmd"] {
        settings.register_option(OptionSpec::new(
            format!("plugins.{plugin_type}"),
            "order",
            empty_list(),
            format!("Priority of the {plugin_type} plugins, first listed runs first"),
        ))?;
    }

    settings.register_option(OptionSpec::new(
        "resolver",
        "references",
        empty_list(),
        "Test references, such as paths, to resolve",
    ))?;

    settings.register_option(
        OptionSpec::new(
            "resolver",
            "hint_file",
            DEFAULT_HINT_FILE,
            "Hint file consulted before the resolver plugins, when it exists",
        )
        .key_type(KeyType::Path),
    )?;

    settings.register_option(OptionSpec::new(
        "run",
        "ignore_missing_references",
        false,
        "Carry on when a reference cannot be resolved into any runnable",
    ))?;

    settings.register_option(OptionSpec::new(
        "filter.by_tags",
        "tags",
        empty_list(),
        "Keep only runnables matching one of these tag expressions",
    ))?;

    settings.register_option(OptionSpec::new(
        "filter.by_tags",
        "include_empty",
        false,
        "Keep runnables without any tag when filtering by tags",
    ))?;

    settings.register_option(OptionSpec::new(
        "filter.by_tags",
        "include_empty_key",
        false,
        "Treat a key:value atom as matching when the runnable lacks the key",
    ))?;

    settings.register_option(OptionSpec::new(
        "runner",
        "identifier_format",
        DEFAULT_IDENTIFIER_FORMAT,
        "Template for runnable identifiers, using {uri}, {args} and {kwargs}",
    ))?;

    settings.register_option(
        OptionSpec::new(
            "discoverer",
            "test_dir",
            "",
            "Directory walked by the builtin discoverers when no reference is given",
        )
        .key_type(KeyType::Path),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_defaults() {
        let mut settings = Settings::empty();
        register_core_options(&mut settings).unwrap();
        let config = settings.snapshot();

        assert!(config.get_list("plugins.disable").is_empty());
        assert!(config.contains("plugins.cli.cmd.order"));
        assert_eq!(config.get_str("resolver.hint_file"), Some(".quarry.hint"));
        assert_eq!(config.get_str("runner.identifier_format"), Some("{uri}"));
        assert!(!config.get_bool("filter.by_tags.include_empty"));
        assert_eq!(config.len(), 13);
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut settings = Settings::empty();
        register_core_options(&mut settings).unwrap();
        assert!(register_core_options(&mut settings).is_err());
    }
}

use quarry_core::{
    Config, PluginError, PluginResult, Settings, TagFilter,
    config::{ArgAction, CliBinding},
    interfaces::Plugin,
};
use tracing::debug;

use crate::cli::{Cli, exit_codes};

/// Commands whose runnables can be filtered by tags
const FILTERED_COMMANDS: &[&str] = &["list"];

/// First `key:value` atom of `expression` missing its key or its value
fn malformed_atom(expression: &str) -> Option<&str> {
    expression
        .split(',')
        .map(str::trim)
        .filter(|atom| !atom.starts_with('-'))
        .find(|atom| {
            atom.split_once(':')
                .is_some_and(|(key, value)| key.is_empty() || value.is_empty())
        })
}

/// Adds the tag filter options to the commands that list runnables
pub struct TagsCli;

impl Plugin for TagsCli {
    fn name(&self) -> &str {
        "tags"
    }

    fn description(&self) -> &str {
        "Tags filtering support"
    }
}

impl Cli for TagsCli {
    fn configure(&self, settings: &mut Settings) -> PluginResult<()> {
        for &command in FILTERED_COMMANDS {
            settings.add_argparser_to_option(
                "filter.by_tags.tags",
                CliBinding::long(command, "--filter-by-tags")
                    .with_action(ArgAction::Append)
                    .with_metavar("TAGS"),
                true,
            )?;
            settings.add_argparser_to_option(
                "filter.by_tags.include_empty",
                CliBinding::long(command, "--filter-by-tags-include-empty"),
                true,
            )?;
            settings.add_argparser_to_option(
                "filter.by_tags.include_empty_key",
                CliBinding::long(command, "--filter-by-tags-include-empty-key"),
                true,
            )?;
        }
        Ok(())
    }

    /// Reject malformed expressions before any reference is resolved
    fn run(&self, config: &Config) -> PluginResult<()> {
        for expression in config.get_list("filter.by_tags.tags") {
            if let Some(atom) = malformed_atom(expression) {
                eprintln!("Invalid tag \"{atom}\" in filter \"{expression}\": expected key:value");
                return Err(PluginError::Exit(exit_codes::FAIL));
            }
        }
        let filter = TagFilter::from_config(config);
        if !filter.is_empty() {
            debug!("Filtering runnables by tags: {:?}", filter);
        }
        Ok(())
    }
}

use clap::Command;
use quarry_core::{
    Error, PluginResult, ReferenceResolution, Runnable, Settings, Tags,
    config::{CliBinding, DEFAULT_IDENTIFIER_FORMAT, OptionSpec},
    interfaces::Plugin,
    orchestrator,
};
use tracing::error;

use super::resolve::{RESOLUTION_HEADER, bind_references, resolution_rows};
use crate::cli::{CliCmd, RunContext, exit_codes};
use crate::display::{summary, tabular};

/// `flat,key:value` rendering of a tag map
pub fn format_tags(tags: &Tags) -> String {
    tags.iter()
        .flat_map(|(name, values)| match values {
            None => vec![name.clone()],
            Some(values) => values.iter().map(|value| format!("{name}:{value}")).collect(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn render(
    resolutions: &[ReferenceResolution],
    runnables: &[Runnable],
    identifier_format: &str,
    verbose: bool,
) -> String {
    let mut out = if verbose {
        let rows: Vec<[String; 3]> = runnables
            .iter()
            .map(|r| [r.kind().to_string(), r.identifier(identifier_format), format_tags(r.tags())])
            .collect();
        tabular(&rows, Some(&["Type", "Test", "Tag(s)"][..]))
    } else {
        let rows: Vec<[String; 2]> = runnables
            .iter()
            .map(|r| [r.kind().to_string(), r.identifier(identifier_format)])
            .collect();
        tabular(&rows, None)
    };

    if verbose {
        let unresolved: Vec<ReferenceResolution> = resolutions
            .iter()
            .filter(|resolution| !resolution.is_success())
            .cloned()
            .collect();
        if !unresolved.is_empty() {
            out.push('\n');
            out.push_str(&tabular(&resolution_rows(&unresolved, true), Some(&RESOLUTION_HEADER[..])));
        }
        out.push_str(&summary("TEST TYPES SUMMARY", &orchestrator::stats(runnables)));
        out.push_str(&summary("TEST TAGS SUMMARY", &orchestrator::tag_stats(runnables)));
    }
    out
}

/// Lists the runnables of a suite after tag filtering
pub struct List;

impl Plugin for List {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "Lists the tests a set of references resolves into"
    }
}

impl CliCmd for List {
    fn configure(&self, settings: &mut Settings) -> PluginResult<Command> {
        settings.register_option(
            OptionSpec::new(
                "list",
                "verbose",
                false,
                "Show tags, unresolved references and summaries",
            )
            .cli(CliBinding::long("list", "--verbose").with_short('V')),
        )?;
        bind_references(settings, "list")?;
        settings.add_argparser_to_option(
            "run.ignore_missing_references",
            CliBinding::long("list", "--ignore-missing-references"),
            true,
        )?;
        Ok(Command::new(self.name().to_string()).about(self.description().to_string()))
    }

    fn run(&self, context: &RunContext<'_>) -> PluginResult<i32> {
        let resolutions = match context.orchestrator.resolve_from_config(context.config, false) {
            Ok(resolutions) => resolutions,
            Err(Error::MissingReferences(missing)) => {
                error!("Could not resolve references: {}", missing.join(", "));
                eprintln!("Could not resolve references: {}", missing.join(", "));
                return Ok(exit_codes::FAIL);
            }
            Err(err) => return Err(err.into()),
        };

        let runnables = orchestrator::filter(&resolutions, context.config);
        let identifier_format = context
            .config
            .get_str("runner.identifier_format")
            .unwrap_or(DEFAULT_IDENTIFIER_FORMAT);
        print!(
            "{}",
            render(&resolutions, &runnables, identifier_format, context.config.get_bool("list.verbose"))
        );
        Ok(exit_codes::ALL_OK)
    }
}

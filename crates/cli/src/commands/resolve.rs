use clap::Command;
use quarry_core::{
    PluginResult, ReferenceResolution, Settings,
    config::{CliBinding, Nargs, OptionSpec},
    interfaces::Plugin,
    orchestrator,
};

use crate::cli::{CliCmd, RunContext, exit_codes};
use crate::display::{summary, tabular};

/// Option namespace of the references positional
pub(crate) const REFERENCES: &str = "resolver.references";

/// Bind the references positional to `parser`
pub(crate) fn bind_references(settings: &mut Settings, parser: &str) -> quarry_core::Result<()> {
    settings.add_argparser_to_option(
        REFERENCES,
        CliBinding::positional(parser)
            .with_nargs(Nargs::ZeroOrMore)
            .with_metavar("TEST_REFERENCE"),
        true,
    )
}

/// `[resolver, reference, result, info]` rows; non-successful
/// resolutions only when `all` is set
pub(crate) fn resolution_rows(resolutions: &[ReferenceResolution], all: bool) -> Vec<[String; 4]> {
    resolutions
        .iter()
        .filter(|resolution| all || resolution.is_success())
        .map(|resolution| {
            let info = if resolution.is_success() {
                format!("{} runnable(s)", resolution.resolutions().len())
            } else {
                resolution.info().unwrap_or_default().to_string()
            };
            [
                resolution.origin().to_string(),
                resolution.reference().to_string(),
                resolution.result().to_string(),
                info,
            ]
        })
        .collect()
}

pub const RESOLUTION_HEADER: [&str; 4] = ["Resolver", "Reference", "Result", "Info"];

fn render(resolutions: &[ReferenceResolution], verbose: bool) -> String {
    let rows = resolution_rows(resolutions, verbose);
    let mut out = tabular(&rows, Some(&RESOLUTION_HEADER[..]));
    if verbose {
        let runnables = orchestrator::resolutions_to_runnables(resolutions);
        out.push_str(&summary("TEST TYPES SUMMARY", &orchestrator::stats(&runnables)));
    }
    out
}

/// Shows how each reference was resolved
pub struct Resolve;

impl Plugin for Resolve {
    fn name(&self) -> &str {
        "resolve"
    }

    fn description(&self) -> &str {
        "Resolves test references and shows which plugin resolved them"
    }
}

impl CliCmd for Resolve {
    fn configure(&self, settings: &mut Settings) -> PluginResult<Command> {
        settings.register_option(
            OptionSpec::new(
                "resolve",
                "verbose",
                false,
                "Also show references that could not be resolved, and a summary",
            )
            .cli(CliBinding::long("resolve", "--verbose").with_short('V')),
        )?;
        bind_references(settings, "resolve")?;
        Ok(Command::new(self.name().to_string()).about(self.description().to_string()))
    }

    fn run(&self, context: &RunContext<'_>) -> PluginResult<i32> {
        // Unresolved references are part of what this command reports
        let resolutions = context.orchestrator.resolve_from_config(context.config, true)?;
        print!("{}", render(&resolutions, context.config.get_bool("resolve.verbose")));
        Ok(exit_codes::ALL_OK)
    }
}

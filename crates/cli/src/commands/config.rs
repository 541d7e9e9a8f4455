use clap::Command;
use quarry_core::{
    PluginResult, Settings,
    config::{CliBinding, OptionSpec},
    interfaces::Plugin,
};

use crate::cli::{CliCmd, RunContext, exit_codes};
use crate::display::tabular;

fn render(settings: &Settings) -> String {
    let mut out =
        String::from("Config files read (in order, '*' means the file exists and had been read):\n");
    for path in settings.all_config_paths() {
        let marker = if settings.config_paths().contains(path) { '*' } else { ' ' };
        out.push_str(&format!("    {marker} {}\n", path.display()));
    }
    out.push('\n');

    let rows: Vec<[String; 2]> = settings
        .options()
        .map(|option| [option.namespace().to_string(), option.value().to_string()])
        .collect();
    out.push_str(&tabular(&rows, Some(&["Section.Key", "Value"][..])));
    out
}

/// Shows the configuration files read and the resulting settings
pub struct ConfigCmd;

impl Plugin for ConfigCmd {
    fn name(&self) -> &str {
        "config"
    }

    fn description(&self) -> &str {
        "Shows the configuration files read and the current settings"
    }
}

impl CliCmd for ConfigCmd {
    fn configure(&self, settings: &mut Settings) -> PluginResult<Command> {
        settings.register_option(
            OptionSpec::new("config", "json", false, "Print the settings as JSON")
                .cli(CliBinding::long("config", "--json")),
        )?;
        Ok(Command::new(self.name().to_string()).about(self.description().to_string()))
    }

    fn run(&self, context: &RunContext<'_>) -> PluginResult<i32> {
        if context.config.get_bool("config.json") {
            println!("{}", context.settings.as_json()?);
        } else {
            print!("{}", render(context.settings));
        }
        Ok(exit_codes::ALL_OK)
    }
}

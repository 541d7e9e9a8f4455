use clap::Command;
use quarry_core::{ExtensionManager, PluginResult, Settings, interfaces::Plugin};

use crate::cli::{CliCmd, RunContext, exit_codes};
use crate::display::tabular;

/// One titled block per plugin namespace
pub fn describe<P: Plugin + ?Sized>(title: &str, manager: &ExtensionManager<P>) -> String {
    let mut out = format!("{title} ({}):\n", manager.plugin_type());
    if manager.is_empty() {
        out.push_str("    (No active plugins)\n");
    } else {
        let rows: Vec<[&str; 2]> = manager
            .iter()
            .map(|ext| [ext.name(), ext.obj().description()])
            .collect();
        for line in tabular(&rows, None).lines() {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
    }
    for failure in manager.load_failures() {
        out.push_str(&format!(
            "    Failed to load {}.{}: {}\n",
            failure.namespace, failure.name, failure.error
        ));
    }
    out.push('\n');
    out
}

/// Shows every active plugin
pub struct Plugins;

impl Plugin for Plugins {
    fn name(&self) -> &str {
        "plugins"
    }

    fn description(&self) -> &str {
        "Displays the active plugins of every kind"
    }
}

impl CliCmd for Plugins {
    fn configure(&self, _settings: &mut Settings) -> PluginResult<Command> {
        Ok(Command::new(self.name().to_string()).about(self.description().to_string()))
    }

    fn run(&self, context: &RunContext<'_>) -> PluginResult<i32> {
        let resolvers = ExtensionManager::new(context.orchestrator.resolvers(), context.config)?;
        let discoverers = ExtensionManager::new(context.orchestrator.discoverers(), context.config)?;
        let settings = ExtensionManager::new(context.settings_plugins, context.config)?;

        let mut out = String::new();
        out.push_str(&describe("Plugins that add options to commands", context.cli));
        out.push_str(&describe("Plugins that add commands", context.cmds));
        out.push_str(&describe("Plugins that resolve test references", &resolvers));
        out.push_str(&describe("Plugins that discover tests", &discoverers));
        out.push_str(&describe("Plugins that adjust configuration paths", &settings));
        print!("{out}");
        Ok(exit_codes::ALL_OK)
    }
}

//! Command-line dispatcher
//!
//! The command line is assembled from plugins. `cli.cmd` plugins each
//! contribute one subcommand, `cli` plugins contribute options to existing
//! commands. Startup runs in two phases: every plugin is configured first,
//! then, once arguments and configuration files are merged into a frozen
//! [`Config`], the `cli` plugins run followed by the selected subcommand.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command, value_parser};
use tracing::debug;

use quarry_core::{
    Config, Error, ExtensionManager, Orchestrator, PluginError, PluginRegistry, Settings,
    config::register_core_options,
    error::PluginResult,
    interfaces::{Plugin, SettingsPlugin},
    plugins,
};

use crate::args::{CONFIG_ARG, VERBOSE_ARG, add_bound_args, parsed_arguments};
use crate::commands::{ConfigCmd, List, Plugins, Resolve, TagsCli};

/// Process exit codes
pub mod exit_codes {
    pub const ALL_OK: i32 = 0;
    /// A command could not do what was asked
    pub const FAIL: i32 = 4;
    pub const INTERRUPTED: i32 = 8;
}

/// Namespace of the plugins adding options to existing commands
pub const CLI_NAMESPACE: &str = "cli";

/// Namespace of the subcommand plugins
pub const CLI_CMD_NAMESPACE: &str = "cli.cmd";

/// A plugin adding one subcommand
pub trait CliCmd: Plugin {
    /// Register the command's options and return its (sub)command.
    ///
    /// Options bound to the command's name are added to the returned
    /// command by the dispatcher.
    fn configure(&self, settings: &mut Settings) -> PluginResult<Command>;

    /// Run the command; the returned value is the process exit code
    fn run(&self, context: &RunContext<'_>) -> PluginResult<i32>;
}

/// A plugin contributing options to commands it does not own
pub trait Cli: Plugin {
    fn configure(&self, settings: &mut Settings) -> PluginResult<()>;

    /// Called with the final configuration before the subcommand runs
    fn run(&self, config: &Config) -> PluginResult<()>;
}

/// Everything a subcommand can look at while running
pub struct RunContext<'a> {
    pub config: &'a Config,
    pub settings: &'a Settings,
    pub orchestrator: &'a Orchestrator,
    pub settings_plugins: &'a PluginRegistry<dyn SettingsPlugin>,
    pub cli: &'a ExtensionManager<dyn Cli>,
    pub cmds: &'a ExtensionManager<dyn CliCmd>,
}

/// Builtin option contributors
pub fn cli_plugins() -> PluginRegistry<dyn Cli> {
    PluginRegistry::new(CLI_NAMESPACE).with_entry("tags", |_| Ok(Box::new(TagsCli) as Box<dyn Cli>))
}

/// Builtin subcommands
pub fn cmd_plugins() -> PluginRegistry<dyn CliCmd> {
    PluginRegistry::new(CLI_CMD_NAMESPACE)
        .with_entry("config", |_| Ok(Box::new(ConfigCmd) as Box<dyn CliCmd>))
        .with_entry("list", |_| Ok(Box::new(List) as Box<dyn CliCmd>))
        .with_entry("plugins", |_| Ok(Box::new(Plugins) as Box<dyn CliCmd>))
        .with_entry("resolve", |_| Ok(Box::new(Resolve) as Box<dyn CliCmd>))
}

/// The top-level command, before any plugin contributed to it
pub fn root_command() -> Command {
    Command::new("quarry")
        .version(clap::crate_version!())
        .about("Resolve test references into runnable test suites")
        .after_help("ENVIRONMENT:\n    RUST_LOG=debug       Enable debug logging\n    QUARRY_PREFIX=DIR    Look for configuration under DIR")
        .arg(
            Arg::new(CONFIG_ARG)
                .long("config")
                .value_name("CONFIG_FILE")
                .help("Read an additional configuration file, may be given more than once")
                .action(ArgAction::Append)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(VERBOSE_ARG)
                .short('v')
                .long("verbose")
                .help("Log debug messages to stderr")
                .action(ArgAction::SetTrue),
        )
}

/// Whether a top-level `-v/--verbose` precedes the subcommand.
///
/// Used before parsing, so logging is set up while plugins load.
pub fn wants_verbose(args: &[OsString]) -> bool {
    let mut args = args.iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("-v" | "--verbose") => return true,
            Some("--config") => {
                args.next();
            }
            Some(arg) if arg.starts_with('-') => {}
            _ => return false,
        }
    }
    false
}

fn sentinel_code(err: Error) -> Result<i32> {
    match err {
        Error::Exit(code) => Ok(code),
        Error::Interrupted => Ok(exit_codes::INTERRUPTED),
        other => Err(other.into()),
    }
}

/// The quarry command-line application
pub struct App {
    settings: Settings,
    settings_plugins: PluginRegistry<dyn SettingsPlugin>,
    orchestrator: Orchestrator,
    cli_plugins: PluginRegistry<dyn Cli>,
    cmd_plugins: PluginRegistry<dyn CliCmd>,
}

impl App {
    /// Application over the builtin plugins and the default configuration
    /// search paths
    pub fn new() -> Result<Self> {
        let settings_plugins = plugins::settings_plugins();
        let settings = Settings::new(&settings_plugins).context("Failed to read configuration")?;
        Ok(Self::with_parts(
            settings,
            settings_plugins,
            Orchestrator::builtin(),
            cli_plugins(),
            cmd_plugins(),
        ))
    }

    pub fn with_parts(
        settings: Settings,
        settings_plugins: PluginRegistry<dyn SettingsPlugin>,
        orchestrator: Orchestrator,
        cli_plugins: PluginRegistry<dyn Cli>,
        cmd_plugins: PluginRegistry<dyn CliCmd>,
    ) -> Self {
        Self {
            settings,
            settings_plugins,
            orchestrator,
            cli_plugins,
            cmd_plugins,
        }
    }

    /// Parse `argv` (program name first) and run the selected command
    pub fn run<I, T>(mut self, argv: I) -> Result<i32>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        register_core_options(&mut self.settings)?;
        self.settings.merge_with_configs()?;
        let early = self.settings.snapshot();

        let cli = ExtensionManager::new(&self.cli_plugins, &early)?;
        let cmds = ExtensionManager::new(&self.cmd_plugins, &early)?;

        let settings = &mut self.settings;
        let subcommands = match cmds.map_method_with_return("configure", |cmd| cmd.configure(settings)) {
            Ok(subcommands) => subcommands,
            Err(err) => return sentinel_code(err),
        };
        if let Err(err) = cli.map_method("configure", |plugin| plugin.configure(settings)) {
            return sentinel_code(err);
        }
        // Options registered by plugins pick up their file values only now
        self.settings.merge_with_configs()?;

        let mut root = add_bound_args(root_command(), &self.settings, "");
        for subcommand in subcommands {
            let name = subcommand.get_name().to_string();
            root = root.subcommand(add_bound_args(subcommand, &self.settings, &name));
        }

        let matches = match root.try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(err) => {
                err.print()?;
                return Ok(err.exit_code());
            }
        };

        if let Some(paths) = matches.get_many::<PathBuf>(CONFIG_ARG) {
            for path in paths {
                self.settings
                    .process_config_path(path)
                    .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
            }
            self.settings.merge_with_configs()?;
        }

        let root_args = parsed_arguments(&self.settings, "", &matches)?;
        self.settings.merge_with_arguments(&root_args)?;
        if let Some((name, sub_matches)) = matches.subcommand() {
            let sub_args = parsed_arguments(&self.settings, name, sub_matches)?;
            self.settings.merge_with_arguments(&sub_args)?;
        }
        let config = self.settings.snapshot();

        if let Err(err) = cli.map_method("run", |plugin| plugin.run(&config)) {
            return sentinel_code(err);
        }

        let Some((name, _)) = matches.subcommand() else {
            debug!("No subcommand given");
            return Ok(exit_codes::ALL_OK);
        };

        let context = RunContext {
            config: &config,
            settings: &self.settings,
            orchestrator: &self.orchestrator,
            settings_plugins: &self.settings_plugins,
            cli: &cli,
            cmds: &cmds,
        };
        debug!("Running subcommand {}", name);
        match cmds.get(name)?.obj().run(&context) {
            Ok(code) => Ok(code),
            Err(PluginError::Exit(code)) => Ok(code),
            Err(PluginError::Interrupted) => Ok(exit_codes::INTERRUPTED),
            Err(PluginError::Failed(err)) => Err(err.context(format!("Command \"{name}\" failed"))),
        }
    }
}

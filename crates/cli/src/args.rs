//! Glue between registered settings and clap
//!
//! Every option bound to a parser becomes a clap argument whose id is the
//! option namespace, so parsed values map straight back to settings.

use anyhow::{Result, anyhow};
use clap::{
    Arg, ArgAction as ClapAction, ArgMatches, Command, builder::PossibleValuesParser,
    parser::ValueSource,
};
use quarry_core::config::{
    ArgAction, CliBinding, ConfigOption, Nargs, ParsedArguments, SettingValue, Settings,
};

/// Id of the top-level `--config` argument
pub const CONFIG_ARG: &str = "config";

/// Id of the top-level `--verbose` argument
pub const VERBOSE_ARG: &str = "verbose";

fn takes_many(option: &ConfigOption, binding: &CliBinding) -> bool {
    match option.action(binding) {
        ArgAction::Append => true,
        ArgAction::StoreTrue | ArgAction::StoreFalse => false,
        ArgAction::Store => matches!(
            binding.nargs,
            Some(Nargs::ZeroOrMore | Nargs::OneOrMore) | Some(Nargs::Exactly(2..))
        ),
    }
}

/// Build the clap argument for `option` on one parser
pub fn to_arg(option: &ConfigOption, binding: &CliBinding) -> Arg {
    let mut arg = Arg::new(option.namespace().to_string()).help(option.help().to_string());

    if !binding.positional {
        if let Some(long) = binding.long_name() {
            arg = arg.long(long.to_string());
        }
        if let Some(short) = binding.short_arg {
            arg = arg.short(short);
        }
    }

    arg = match option.action(binding) {
        ArgAction::StoreTrue => arg.action(ClapAction::SetTrue),
        ArgAction::StoreFalse => arg.action(ClapAction::SetFalse),
        _ if takes_many(option, binding) => arg.action(ClapAction::Append),
        _ => arg.action(ClapAction::Set),
    };

    if let Some(nargs) = binding.nargs {
        arg = match nargs {
            Nargs::Optional => arg.num_args(0..=1),
            Nargs::ZeroOrMore => arg.num_args(0..),
            Nargs::OneOrMore => arg.num_args(1..),
            Nargs::Exactly(count) => arg.num_args(count),
        };
    }

    if let Some(metavar) = option.metavar(binding) {
        arg = arg.value_name(metavar.to_string());
    }
    if !binding.choices.is_empty() {
        arg = arg.value_parser(PossibleValuesParser::new(binding.choices.clone()));
    }
    if binding.required {
        arg = arg.required(true);
    }
    arg
}

/// Add the arguments bound to `parser` to `command`
pub fn add_bound_args(command: Command, settings: &Settings, parser: &str) -> Command {
    settings
        .bindings_for(parser)
        .fold(command, |command, (option, binding)| command.arg(to_arg(option, binding)))
}

/// Values of the arguments bound to `parser` that were given on the
/// command line; the others are recorded as unset
pub fn parsed_arguments(settings: &Settings, parser: &str, matches: &ArgMatches) -> Result<ParsedArguments> {
    let mut parsed = ParsedArguments::new();

    for (option, binding) in settings.bindings_for(parser) {
        let id = option.namespace();
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            parsed.entry(id.to_string()).or_insert(None);
            continue;
        }

        let value = match option.action(binding) {
            ArgAction::StoreTrue | ArgAction::StoreFalse => SettingValue::Bool(matches.get_flag(id)),
            _ => {
                let values: Vec<String> = matches
                    .get_many::<String>(id)
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default();
                if takes_many(option, binding) {
                    SettingValue::List(values)
                } else {
                    let raw = values.first().map(String::as_str).unwrap_or_default();
                    option
                        .key_type()
                        .convert(raw)
                        .map_err(|reason| anyhow!("invalid value \"{raw}\" for {id}: {reason}"))?
                }
            }
        };
        parsed.insert(id.to_string(), Some(value));
    }

    Ok(parsed)
}

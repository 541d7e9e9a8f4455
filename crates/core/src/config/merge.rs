//! Configuration merging logic for quarry
//!
//! Implements the precedence: defaults -> config files (in read order) ->
//! command-line arguments. The settings registry applies the same rules
//! step by step; `merge_layers` computes the final map in one go.

use std::collections::BTreeMap;

use tracing::debug;

use super::{ini::IniDocument, option::ConfigOption, value::SettingValue};
use crate::error::{Error, Result};

/// Parsed command-line values keyed by namespace.
///
/// `None` marks an argument the user did not pass, which is different
/// from passing the default value explicitly.
pub type ParsedArguments = BTreeMap<String, Option<SettingValue>>;

/// Coerce a raw config file string with the option's key type
pub(crate) fn convert_raw(option: &ConfigOption, raw: &str) -> Result<SettingValue> {
    option
        .key_type()
        .convert(raw)
        .map_err(|reason| Error::SettingsValue {
            namespace: option.namespace().to_string(),
            value: raw.to_string(),
            reason,
        })
}

/// Compute `namespace -> value` for `options` from every layer.
///
/// Files are applied in order, so later files win; keys that match no
/// option are ignored. Arguments that are `None` leave the file or
/// default value in place.
pub fn merge_layers<'a, I>(
    options: I,
    files: &[IniDocument],
    arguments: &ParsedArguments,
) -> Result<BTreeMap<String, SettingValue>>
where
    I: IntoIterator<Item = &'a ConfigOption>,
{
    let options: BTreeMap<&str, &ConfigOption> = options
        .into_iter()
        .map(|option| (option.namespace(), option))
        .collect();

    let mut merged: BTreeMap<String, SettingValue> = options
        .iter()
        .map(|(namespace, option)| (namespace.to_string(), option.default_value().clone()))
        .collect();

    for document in files {
        for section in document.sections() {
            for (key, raw) in document.items(section) {
                let namespace = format!("{section}.{key}");
                let Some(option) = options.get(namespace.as_str()) else {
                    debug!("Ignoring unregistered config key {}", namespace);
                    continue;
                };
                merged.insert(namespace, convert_raw(option, raw)?);
            }
        }
    }

    for (namespace, value) in arguments {
        if let (Some(value), true) = (value, options.contains_key(namespace.as_str())) {
            merged.insert(namespace.clone(), value.clone());
        }
    }

    Ok(merged)
}

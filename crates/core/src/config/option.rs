//! Registered configuration options and their command-line bindings

use super::value::{KeyType, SettingValue};

/// How many command-line values an argument consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    Exactly(usize),
}

/// What the parser does when it meets the argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgAction {
    Store,
    StoreTrue,
    StoreFalse,
    Append,
}

/// Attaches an option to one command-line parser.
///
/// `parser` names the (sub)command the argument belongs to; the empty
/// string is the top-level command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliBinding {
    pub parser: String,
    pub long_arg: Option<String>,
    pub short_arg: Option<char>,
    pub positional: bool,
    pub choices: Vec<String>,
    pub nargs: Option<Nargs>,
    pub metavar: Option<String>,
    pub required: bool,
    pub action: Option<ArgAction>,
}

impl CliBinding {
    /// A `--long` style argument on `parser`
    pub fn long(parser: impl Into<String>, long_arg: impl Into<String>) -> Self {
        Self {
            parser: parser.into(),
            long_arg: Some(long_arg.into()),
            ..Default::default()
        }
    }

    /// A positional argument on `parser`
    pub fn positional(parser: impl Into<String>) -> Self {
        Self {
            parser: parser.into(),
            positional: true,
            ..Default::default()
        }
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short_arg = Some(short);
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    pub fn with_metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_action(mut self, action: ArgAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Long argument name without its leading dashes
    pub fn long_name(&self) -> Option<&str> {
        self.long_arg
            .as_deref()
            .map(|arg| arg.trim_start_matches('-'))
    }
}

/// One option in the settings registry
#[derive(Debug, Clone)]
pub struct ConfigOption {
    namespace: String,
    help: String,
    key_type: KeyType,
    default: SettingValue,
    bindings: Vec<CliBinding>,
    value: Option<SettingValue>,
}

impl ConfigOption {
    pub(crate) fn new(
        namespace: String,
        help: String,
        key_type: KeyType,
        default: SettingValue,
    ) -> Self {
        Self {
            namespace,
            help,
            key_type,
            default,
            bindings: Vec::new(),
            value: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Everything before the last dot
    pub fn section(&self) -> &str {
        self.namespace
            .rsplit_once('.')
            .map(|(section, _)| section)
            .unwrap_or("")
    }

    /// The last dotted segment
    pub fn key(&self) -> &str {
        self.namespace
            .rsplit_once('.')
            .map(|(_, key)| key)
            .unwrap_or(&self.namespace)
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    /// Current value, or the default when never updated
    pub fn value(&self) -> &SettingValue {
        self.value.as_ref().unwrap_or(&self.default)
    }

    pub fn bindings(&self) -> &[CliBinding] {
        &self.bindings
    }

    /// Parser action for `binding`, derived from the key type for booleans
    pub fn action(&self, binding: &CliBinding) -> ArgAction {
        if self.key_type.is_bool() {
            return match self.default {
                SettingValue::Bool(true) => ArgAction::StoreFalse,
                _ => ArgAction::StoreTrue,
            };
        }
        binding.action.unwrap_or(ArgAction::Store)
    }

    /// Metavar for `binding`; positionals fall back to the key
    pub fn metavar<'a>(&'a self, binding: &'a CliBinding) -> Option<&'a str> {
        match (&binding.metavar, binding.positional) {
            (Some(metavar), _) => Some(metavar),
            (None, true) => Some(self.key()),
            (None, false) => None,
        }
    }

    pub(crate) fn add_binding(&mut self, binding: CliBinding) {
        self.bindings.push(binding);
    }

    pub(crate) fn set_value(&mut self, value: SettingValue) {
        self.value = Some(value);
    }
}

/// Everything needed to register an option.
///
/// The key type is inferred from the default unless set explicitly.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub section: String,
    pub key: String,
    pub default: SettingValue,
    pub help: String,
    pub key_type: KeyType,
    pub binding: Option<CliBinding>,
    pub allow_multiple: bool,
}

impl OptionSpec {
    pub fn new(
        section: impl Into<String>,
        key: impl Into<String>,
        default: impl Into<SettingValue>,
        help: impl Into<String>,
    ) -> Self {
        let default = default.into();
        Self {
            section: section.into(),
            key: key.into(),
            key_type: KeyType::infer(&default),
            default,
            help: help.into(),
            binding: None,
            allow_multiple: false,
        }
    }

    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn cli(mut self, binding: CliBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Permit registering the same namespace again to attach another parser
    pub fn allow_multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    pub fn namespace(&self) -> String {
        format!("{}.{}", self.section, self.key)
    }
}

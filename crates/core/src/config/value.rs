//! Setting values and the key types that coerce raw strings into them

use serde::Serialize;
use std::fmt;

/// A typed setting value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl SettingValue {
    /// Build a list value
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SettingValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SettingValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Null => f.write_str("None"),
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Int(i) => write!(f, "{i}"),
            SettingValue::Float(x) => write!(f, "{x}"),
            SettingValue::Str(s) => f.write_str(s),
            SettingValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Str(value)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(value: Vec<String>) -> Self {
        SettingValue::List(value)
    }
}

/// Conversion used by [`KeyType::Custom`]
pub type Converter = fn(&str) -> Result<SettingValue, String>;

/// The type an option's raw string values are coerced into
#[derive(Debug, Clone, Copy)]
pub enum KeyType {
    Str,
    Int,
    Float,
    Bool,
    List,
    /// A string with a leading `~` expanded to the home directory
    Path,
    Custom { name: &'static str, convert: Converter },
}

impl KeyType {
    /// Infer the key type from a default value
    pub fn infer(default: &SettingValue) -> Self {
        match default {
            SettingValue::Bool(_) => KeyType::Bool,
            SettingValue::Int(_) => KeyType::Int,
            SettingValue::Float(_) => KeyType::Float,
            SettingValue::List(_) => KeyType::List,
            SettingValue::Null | SettingValue::Str(_) => KeyType::Str,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyType::Str => "str",
            KeyType::Int => "int",
            KeyType::Float => "float",
            KeyType::Bool => "bool",
            KeyType::List => "list",
            KeyType::Path => "path",
            KeyType::Custom { name, .. } => *name,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, KeyType::Bool)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, KeyType::List)
    }

    /// Coerce a raw string into this type
    pub fn convert(&self, raw: &str) -> Result<SettingValue, String> {
        match self {
            KeyType::Str => Ok(SettingValue::Str(raw.to_string())),
            KeyType::Int => raw
                .trim()
                .parse::<i64>()
                .map(SettingValue::Int)
                .map_err(|e| e.to_string()),
            KeyType::Float => raw
                .trim()
                .parse::<f64>()
                .map(SettingValue::Float)
                .map_err(|e| e.to_string()),
            KeyType::Bool => Ok(SettingValue::Bool(parse_bool(raw))),
            KeyType::List => Ok(SettingValue::List(parse_list(raw))),
            KeyType::Path => Ok(SettingValue::Str(expand_user(raw.trim()))),
            KeyType::Custom { convert, .. } => convert(raw),
        }
    }
}

/// Truthy spellings accepted in configuration files
const TRUE_VALUES: &[&str] = &["true", "on", "y", "yes", "1"];

pub fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    TRUE_VALUES.contains(&lowered.as_str())
}

/// Parse `a,b,c` or `[a,b,c]` into a list, dropping empty elements
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn expand_user(raw: &str) -> String {
    let home = std::env::var("HOME").ok();
    match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{home}{rest}")
        }
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_list("[a, b,,c]"), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
        assert!(parse_list("[]").is_empty());
    }

    #[test]
    fn test_parse_bool() {
        for raw in ["true", "On", "Y", "yes", "1", " TRUE "] {
            assert!(parse_bool(raw), "{raw} should be true");
        }
        for raw in ["false", "off", "0", "nope", ""] {
            assert!(!parse_bool(raw), "{raw} should be false");
        }
    }

    #[test]
    fn test_convert_int() {
        assert_eq!(KeyType::Int.convert(" 42 "), Ok(SettingValue::Int(42)));
        assert!(KeyType::Int.convert("forty").is_err());
    }

    #[test]
    fn test_custom_converter() {
        fn upper(raw: &str) -> Result<SettingValue, String> {
            Ok(SettingValue::Str(raw.to_uppercase()))
        }
        let key_type = KeyType::Custom {
            name: "upper",
            convert: upper,
        };
        assert_eq!(key_type.convert("abc"), Ok(SettingValue::from("ABC")));
        assert_eq!(key_type.name(), "upper");
    }

    #[test]
    fn test_infer() {
        assert!(KeyType::infer(&SettingValue::Bool(false)).is_bool());
        assert!(KeyType::infer(&SettingValue::list(Vec::<String>::new())).is_list());
        assert_eq!(KeyType::infer(&SettingValue::Null).name(), "str");
    }
}

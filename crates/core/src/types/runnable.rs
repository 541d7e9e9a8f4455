use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::Result;

/// Tag map of a runnable.
///
/// `None` marks a flat tag, `Some(values)` a key:val tag. Value sets are
/// never empty: a key with no values is simply absent.
pub type Tags = BTreeMap<String, Option<BTreeSet<String>>>;

/// Describes one executable unit produced by reference resolution.
///
/// A runnable is built once (through the `with_*` builder methods) and is
/// not mutated afterwards. Equality is structural on every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Recipe")]
pub struct Runnable {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    kwargs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    tags: Tags,
}

/// On-disk shape of a runnable recipe
#[derive(Deserialize)]
struct Recipe {
    kind: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    kwargs: BTreeMap<String, String>,
    #[serde(default)]
    tags: Tags,
}

impl From<Recipe> for Runnable {
    fn from(recipe: Recipe) -> Self {
        Runnable {
            kind: recipe.kind,
            uri: recipe.uri,
            args: recipe.args,
            kwargs: recipe.kwargs,
            tags: normalize_tags(recipe.tags),
        }
    }
}

fn normalize_tags(tags: Tags) -> Tags {
    tags.into_iter()
        .filter(|(_, values)| values.as_ref().is_none_or(|set| !set.is_empty()))
        .collect()
}

impl Runnable {
    /// Create a runnable of the given kind pointing at `uri`
    pub fn new(kind: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            uri: Some(uri.into()),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            tags: Tags::new(),
        }
    }

    /// Create a runnable that carries no uri
    pub fn without_uri(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            uri: None,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            tags: Tags::new(),
        }
    }

    /// Builder method for positional arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builder method for a single named argument
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Builder method for a flat tag
    pub fn with_flat_tag(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        // A key that already has values keeps them
        self.tags.entry(name).or_insert(None);
        self
    }

    /// Builder method for a key:val tag
    pub fn with_tag_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let slot = self.tags.entry(key.into()).or_insert(None);
        slot.get_or_insert_with(BTreeSet::new).insert(value.into());
        self
    }

    /// Builder method merging a whole tag map
    pub fn with_tags(mut self, tags: Tags) -> Self {
        for (key, values) in normalize_tags(tags) {
            match values {
                None => self = self.with_flat_tag(key),
                Some(values) => {
                    for value in values {
                        self = self.with_tag_value(key.clone(), value);
                    }
                }
            }
        }
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn kwargs(&self) -> &BTreeMap<String, String> {
        &self.kwargs
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Render an identifier from a format such as `{uri}-{args[0]}`.
    ///
    /// Supported fields are `{uri}`, `{args}`, `{args[N]}`, `{kwargs}` and
    /// `{kwargs[KEY]}`. Whole lists are joined with `-`. An empty format
    /// falls back to the uri.
    pub fn identifier(&self, format: &str) -> String {
        if format.is_empty() {
            return self.uri.clone().unwrap_or_default();
        }

        static FIELD: OnceLock<Regex> = OnceLock::new();
        let field = FIELD.get_or_init(|| {
            Regex::new(r"\{(uri|args|kwargs)(?:\[([^\]]*)\])?\}").expect("valid identifier regex")
        });

        field
            .replace_all(format, |caps: &regex::Captures<'_>| {
                let index = caps.get(2).map(|m| m.as_str());
                match (&caps[1], index) {
                    ("uri", _) => self.uri.clone().unwrap_or_default(),
                    ("args", None) => self.args.join("-"),
                    ("args", Some(index)) => index
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| self.args.get(i).cloned())
                        .unwrap_or_default(),
                    ("kwargs", None) => self
                        .kwargs
                        .values()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join("-"),
                    (_, Some(key)) => self.kwargs.get(key).cloned().unwrap_or_default(),
                    _ => String::new(),
                }
            })
            .into_owned()
    }

    /// JSON recipe of this runnable
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the JSON recipe to `path`
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a runnable from a JSON recipe file
    pub fn from_recipe(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

//! Tag parsing and filtering
//!
//! A filter expression is a comma separated list of atoms, all of which
//! must hold:
//!
//! - `fast`: the flat tag (or key) `fast` is present
//! - `-slow`: no tag or key named `slow` is present
//! - `arch:x86_64`: key `arch` has the value `x86_64`
//! - `arch:-x86_64`: key `arch` does not have the value `x86_64`
//!
//! Several expressions are OR'd together.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    config::Config,
    types::{ReferenceResolution, Runnable, Tags},
};

/// Parse `a,b,key:value` into a tag map.
///
/// Repeated keys accumulate their values.
pub fn parse_tag_list(raw: &str) -> Tags {
    let mut tags = Tags::new();
    for atom in raw.split(',').map(str::trim).filter(|atom| !atom.is_empty()) {
        match atom.split_once(':') {
            Some((key, value)) if !value.is_empty() => {
                tags.entry(key.to_string())
                    .or_insert(None)
                    .get_or_insert_with(BTreeSet::new)
                    .insert(value.to_string());
            }
            Some((key, _)) => {
                tags.entry(key.to_string()).or_insert(None);
            }
            None => {
                tags.entry(atom.to_string()).or_insert(None);
            }
        }
    }
    tags
}

/// One parsed filter expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagExpression {
    must_flat: BTreeSet<String>,
    must_key_val: BTreeMap<String, String>,
    must_not: BTreeSet<String>,
}

impl TagExpression {
    pub fn parse(raw: &str) -> Self {
        let mut expression = Self::default();
        // An empty atom stays a required flat tag, so `fast,` never matches
        for atom in raw.split(',').map(str::trim) {
            if let Some(negated) = atom.strip_prefix('-') {
                expression.must_not.insert(negated.to_string());
            } else if let Some((key, value)) = atom.split_once(':') {
                expression
                    .must_key_val
                    .insert(key.to_string(), value.to_string());
            } else {
                expression.must_flat.insert(atom.to_string());
            }
        }
        expression
    }

    /// Whether a runnable carrying `tags` satisfies every atom
    pub fn matches(&self, tags: &Tags, include_empty_key: bool) -> bool {
        if self.must_not.iter().any(|name| tags.contains_key(name)) {
            return false;
        }

        for (key, value) in &self.must_key_val {
            let Some(present) = tags.get(key) else {
                if include_empty_key {
                    continue;
                }
                return false;
            };
            let has = |v: &str| present.as_ref().is_some_and(|values| values.contains(v));
            match value.strip_prefix('-') {
                Some(unwanted) if has(unwanted) => return false,
                Some(_) => {}
                None if !has(value) => return false,
                None => {}
            }
        }

        self.must_flat.iter().all(|name| tags.contains_key(name))
    }
}

/// Settings of a tag filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    expressions: Vec<TagExpression>,
    include_empty: bool,
    include_empty_key: bool,
}

impl TagFilter {
    pub fn new<I, S>(expressions: I, include_empty: bool, include_empty_key: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            expressions: expressions
                .into_iter()
                .map(|raw| TagExpression::parse(raw.as_ref()))
                .collect(),
            include_empty,
            include_empty_key,
        }
    }

    /// Filter described by the `filter.by_tags.*` settings
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.get_list("filter.by_tags.tags"),
            config.get_bool("filter.by_tags.include_empty"),
            config.get_bool("filter.by_tags.include_empty_key"),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Whether `runnable` survives the filter.
    ///
    /// Without any expression only the `include_empty` switch decides.
    pub fn matches(&self, runnable: &Runnable) -> bool {
        let tags = runnable.tags();
        if tags.is_empty() || self.expressions.is_empty() {
            return self.include_empty;
        }
        self.expressions
            .iter()
            .any(|expression| expression.matches(tags, self.include_empty_key))
    }

    /// Surviving runnables of the successful resolutions, in order
    pub fn apply(&self, resolutions: &[ReferenceResolution]) -> Vec<Runnable> {
        resolutions
            .iter()
            .filter(|resolution| resolution.is_success())
            .flat_map(ReferenceResolution::resolutions)
            .filter(|runnable| self.matches(runnable))
            .cloned()
            .collect()
    }
}

/// Filter the runnables of `resolutions` by tag expressions
pub fn filter_by_tags<S: AsRef<str>>(
    resolutions: &[ReferenceResolution],
    expressions: &[S],
    include_empty: bool,
    include_empty_key: bool,
) -> Vec<Runnable> {
    TagFilter::new(expressions, include_empty, include_empty_key).apply(resolutions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runnables() -> Vec<Runnable> {
        vec![
            Runnable::new("exec-test", "r1")
                .with_tag_value("arch", "x86_64")
                .with_flat_tag("safe"),
            Runnable::new("exec-test", "r2")
                .with_tag_value("arch", "aarch64")
                .with_flat_tag("safe"),
            Runnable::new("exec-test", "r3"),
        ]
    }

    fn uris(runnables: &[Runnable]) -> Vec<&str> {
        runnables.iter().filter_map(Runnable::uri).collect()
    }

    fn resolutions() -> Vec<ReferenceResolution> {
        vec![ReferenceResolution::success("ref", runnables())]
    }

    #[test]
    fn test_key_val_filter() {
        let kept = filter_by_tags(&resolutions(), &["safe,arch:x86_64"], false, false);
        assert_eq!(uris(&kept), vec!["r1"]);

        let kept = filter_by_tags(&resolutions(), &["safe,arch:-x86_64"], false, false);
        assert_eq!(uris(&kept), vec!["r2"]);
    }

    #[test]
    fn test_empty_expression_list() {
        let none: [&str; 0] = [];
        let kept = filter_by_tags(&resolutions(), &none, true, false);
        assert_eq!(uris(&kept), vec!["r1", "r2", "r3"]);

        let kept = filter_by_tags(&resolutions(), &none, false, false);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_expressions_are_ored() {
        let kept = filter_by_tags(&resolutions(), &["arch:aarch64", "arch:x86_64"], false, false);
        assert_eq!(uris(&kept), vec!["r1", "r2"]);
    }

    #[test]
    fn test_must_not() {
        let kept = filter_by_tags(&resolutions(), &["-safe"], true, false);
        assert_eq!(uris(&kept), vec!["r3"]);

        // A key counts as present for negation too
        let kept = filter_by_tags(&resolutions(), &["-arch"], false, false);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_include_empty_key() {
        let extra = vec![ReferenceResolution::success(
            "ref",
            vec![Runnable::new("tap", "r4").with_flat_tag("safe")],
        )];
        assert!(filter_by_tags(&extra, &["safe,os:linux"], false, false).is_empty());
        assert_eq!(uris(&filter_by_tags(&extra, &["safe,os:linux"], false, true)), vec!["r4"]);
    }

    #[test]
    fn test_non_success_resolutions_are_skipped() {
        let mut all = resolutions();
        all.push(ReferenceResolution::not_found("missing"));
        all.push(ReferenceResolution::error("broken", "boom"));
        let kept = filter_by_tags(&all, &["safe"], false, false);
        assert_eq!(uris(&kept), vec!["r1", "r2"]);
    }

    #[test]
    fn test_idempotent_and_ordered() {
        let filter = TagFilter::new(["safe", "-safe"], true, false);
        let once = filter.apply(&resolutions());
        let twice = filter.apply(&[ReferenceResolution::success("again", once.clone())]);
        assert_eq!(once, twice);
        assert_eq!(uris(&once), vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_duplicate_atoms() {
        assert_eq!(
            TagExpression::parse("safe,safe,arch:x86_64"),
            TagExpression::parse("arch:x86_64,safe")
        );
    }

    #[test]
    fn test_empty_atom_never_matches() {
        assert!(filter_by_tags(&resolutions(), &["safe,"], false, false).is_empty());
        assert!(filter_by_tags(&resolutions(), &[""], false, false).is_empty());

        // Untagged runnables still follow include_empty
        let kept = filter_by_tags(&resolutions(), &["safe,"], true, false);
        assert_eq!(uris(&kept), vec!["r3"]);
    }

    #[test]
    fn test_parse_tag_list() {
        let tags = parse_tag_list("fast, arch:x86_64,arch:aarch64,net");
        assert_eq!(tags["fast"], None);
        assert_eq!(tags["net"], None);
        assert_eq!(tags["arch"].as_ref().unwrap().len(), 2);
        assert!(parse_tag_list(" , ").is_empty());
    }
}

//! Turns references into the runnables of a test suite
//!
//! The orchestrator glues the pieces together: hint files, directory
//! expansion, the resolver and discoverer managers, missing reference
//! enforcement and tag filtering.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, info};

use crate::{
    config::Config,
    error::{Error, Result},
    extension::PluginRegistry,
    interfaces::{Discoverer, Resolver},
    plugins,
    resolver::{DiscovererManager, HintParser, ResolverManager, extend_directory},
    tags::TagFilter,
    types::{ReferenceResolution, Runnable},
};

/// Resolution pipeline over a set of resolver and discoverer plugins
pub struct Orchestrator {
    resolvers: PluginRegistry<dyn Resolver>,
    discoverers: PluginRegistry<dyn Discoverer>,
}

impl Orchestrator {
    pub fn new(
        resolvers: PluginRegistry<dyn Resolver>,
        discoverers: PluginRegistry<dyn Discoverer>,
    ) -> Self {
        Self {
            resolvers,
            discoverers,
        }
    }

    /// Pipeline over the builtin plugins
    pub fn builtin() -> Self {
        Self::new(plugins::resolvers(), plugins::discoverers())
    }

    pub fn resolvers(&self) -> &PluginRegistry<dyn Resolver> {
        &self.resolvers
    }

    pub fn discoverers(&self) -> &PluginRegistry<dyn Discoverer> {
        &self.discoverers
    }

    /// Resolve `references` into resolutions.
    ///
    /// Hinted references are used when none are given, and discoverers
    /// run when there is still nothing to resolve. Unless
    /// `ignore_missing` is set, every non-directory reference must get a
    /// successful resolution.
    pub fn resolve(
        &self,
        references: &[String],
        hint: Option<&HintParser>,
        ignore_missing: bool,
        config: &Config,
    ) -> Result<Vec<ReferenceResolution>> {
        let hint_resolutions = hint.map(HintParser::get_resolutions).unwrap_or_default();
        let mut hint_references: HashMap<&str, &ReferenceResolution> = HashMap::new();
        for resolution in &hint_resolutions {
            hint_references.entry(resolution.reference()).or_insert(resolution);
        }

        let references: Vec<String> = if references.is_empty() && !hint_resolutions.is_empty() {
            debug!("Using {} references from the hint file", hint_resolutions.len());
            let mut hinted: Vec<String> = Vec::new();
            for resolution in &hint_resolutions {
                if !hinted.iter().any(|r| r == resolution.reference()) {
                    hinted.push(resolution.reference().to_string());
                }
            }
            hinted
        } else {
            references.to_vec()
        };

        let mut resolutions = Vec::new();
        if references.is_empty() {
            let discoverer = DiscovererManager::new(&self.discoverers, config)?;
            resolutions.extend(discoverer.discover()?);
        } else {
            let resolver = ResolverManager::new(&self.resolvers, config)?;
            let extended: Vec<String> = references
                .iter()
                .flat_map(|reference| extend_directory(reference))
                .collect();
            for reference in &extended {
                match hint_references.get(reference.as_str()) {
                    Some(hinted) => resolutions.push((*hinted).clone()),
                    None => resolutions.extend(resolver.resolve(reference)?),
                }
            }
        }

        if !ignore_missing {
            check_missing(&references, &resolutions)?;
        }

        info!(
            "Resolved {} references into {} runnables",
            references.len(),
            resolutions.iter().map(|r| r.resolutions().len()).sum::<usize>()
        );
        Ok(resolutions)
    }

    /// Resolve the references, hint file and strictness found in `config`.
    ///
    /// With `ignore_missing` set, the strictness setting is overridden.
    pub fn resolve_from_config(&self, config: &Config, ignore_missing: bool) -> Result<Vec<ReferenceResolution>> {
        let references = config.get_list("resolver.references");
        let hint = match config.get_str("resolver.hint_file") {
            Some(path) if !path.is_empty() && Path::new(path).is_file() => {
                debug!("Using hint file {}", path);
                Some(HintParser::from_file(Path::new(path))?)
            }
            _ => None,
        };
        let ignore_missing = ignore_missing || config.get_bool("run.ignore_missing_references");
        self.resolve(references, hint.as_ref(), ignore_missing, config)
    }
}

fn check_missing(references: &[String], resolutions: &[ReferenceResolution]) -> Result<()> {
    let missing: Vec<String> = references
        .iter()
        .filter(|reference| !Path::new(reference.as_str()).is_dir())
        .filter(|reference| {
            !resolutions
                .iter()
                .any(|r| r.reference() == reference.as_str() && r.is_success())
        })
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingReferences(missing))
    }
}

/// Runnables of the successful resolutions, in order
pub fn resolutions_to_runnables(resolutions: &[ReferenceResolution]) -> Vec<Runnable> {
    resolutions
        .iter()
        .filter(|resolution| resolution.is_success())
        .flat_map(|resolution| resolution.resolutions().iter().cloned())
        .collect()
}

/// Apply the `filter.by_tags.*` settings to `resolutions`.
///
/// Without any tag expression every runnable is kept.
pub fn filter(resolutions: &[ReferenceResolution], config: &Config) -> Vec<Runnable> {
    let tag_filter = TagFilter::from_config(config);
    if tag_filter.is_empty() {
        return resolutions_to_runnables(resolutions);
    }
    tag_filter.apply(resolutions)
}

/// Number of runnables per lower-cased kind
pub fn stats(runnables: &[Runnable]) -> BTreeMap<String, usize> {
    let mut stats = BTreeMap::new();
    for runnable in runnables {
        *stats.entry(runnable.kind().to_lowercase()).or_insert(0) += 1;
    }
    stats
}

/// Number of runnables per lower-cased tag name
pub fn tag_stats(runnables: &[Runnable]) -> BTreeMap<String, usize> {
    let mut stats = BTreeMap::new();
    for runnable in runnables {
        for tag in runnable.tags().keys() {
            *stats.entry(tag.to_lowercase()).or_insert(0) += 1;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingValue;
    use crate::types::ReferenceResolutionResult;

    fn sample() -> Vec<ReferenceResolution> {
        vec![
            ReferenceResolution::success(
                "a",
                vec![
                    Runnable::new("exec-test", "a").with_flat_tag("Fast"),
                    Runnable::new("Tap", "b").with_tag_value("arch", "x86_64").with_flat_tag("fast"),
                ],
            ),
            ReferenceResolution::not_found("c"),
        ]
    }

    #[test]
    fn test_stats() {
        let runnables = resolutions_to_runnables(&sample());
        assert_eq!(runnables.len(), 2);

        let kinds = stats(&runnables);
        assert_eq!(kinds["exec-test"], 1);
        assert_eq!(kinds["tap"], 1);

        let tags = tag_stats(&runnables);
        assert_eq!(tags["fast"], 2);
        assert_eq!(tags["arch"], 1);
    }

    #[test]
    fn test_filter_without_expressions_keeps_all() {
        let kept = filter(&sample(), &Config::default());
        assert_eq!(kept.len(), 2);

        let config = Config::default().with("filter.by_tags.tags", SettingValue::list(["arch"]));
        let kept = filter(&sample(), &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].uri(), Some("b"));
    }

    #[test]
    fn test_missing_references() {
        let resolutions = sample();
        let references = vec!["a".to_string(), "c".to_string(), "d".to_string()];
        let err = check_missing(&references, &resolutions).unwrap_err();
        assert!(matches!(err, Error::MissingReferences(ref missing) if missing == &["c", "d"]));
        assert_eq!(resolutions[1].result(), ReferenceResolutionResult::NotFound);
    }
}

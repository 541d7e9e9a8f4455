//! Discovery of runnables that need no reference

use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;
use tracing::{debug, error};

use crate::{
    config::Config,
    error::{Error, PluginError, Result},
    extension::{ExtensionManager, PluginRegistry, panic_message},
    interfaces::Discoverer,
    types::ReferenceResolution,
};

/// Namespace discoverer plugins are registered under
pub const DISCOVERER_NAMESPACE: &str = "discoverer";

pub struct DiscovererManager {
    manager: ExtensionManager<dyn Discoverer>,
}

impl DiscovererManager {
    pub fn new(registry: &PluginRegistry<dyn Discoverer>, config: &Config) -> Result<Self> {
        Ok(Self {
            manager: ExtensionManager::new(registry, config)?,
        })
    }

    pub fn extensions(&self) -> &ExtensionManager<dyn Discoverer> {
        &self.manager
    }

    /// Concatenated resolutions of every discoverer.
    ///
    /// A failing plugin contributes a single `Error` resolution with an
    /// empty reference.
    pub fn discover(&self) -> Result<Vec<ReferenceResolution>> {
        let mut resolutions = Vec::new();

        for ext in self.manager.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| ext.obj().discover()))
                .unwrap_or_else(|payload| {
                    Err(PluginError::Failed(anyhow!(
                        "panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });

            match outcome {
                Ok(found) => {
                    debug!("Discoverer \"{}\" found {} resolutions", ext.name(), found.len());
                    resolutions.extend(found.into_iter().map(|mut resolution| {
                        resolution.stamp_origin(ext.name());
                        resolution
                    }));
                }
                Err(PluginError::Failed(e)) => {
                    error!("Discoverer \"{}\" failed: {:#}", ext.name(), e);
                    debug!("{:?}", e);
                    resolutions.push(
                        ReferenceResolution::error("", format!("{e:#}")).with_origin(ext.name()),
                    );
                }
                Err(PluginError::Exit(code)) => return Err(Error::Exit(code)),
                Err(PluginError::Interrupted) => return Err(Error::Interrupted),
            }
        }

        Ok(resolutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginResult;
    use crate::interfaces::Plugin;
    use crate::types::{ReferenceResolutionResult, Runnable};

    struct Intrinsic;

    impl Plugin for Intrinsic {
        fn name(&self) -> &str {
            "intrinsic"
        }

        fn description(&self) -> &str {
            "built-in health checks"
        }
    }

    impl Discoverer for Intrinsic {
        fn discover(&self) -> PluginResult<Vec<ReferenceResolution>> {
            Ok(vec![ReferenceResolution::success(
                "",
                vec![Runnable::without_uri("sysinfo")],
            )])
        }
    }

    struct Broken;

    impl Plugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails"
        }
    }

    impl Discoverer for Broken {
        fn discover(&self) -> PluginResult<Vec<ReferenceResolution>> {
            Err(anyhow!("cannot list").into())
        }
    }

    #[test]
    fn test_failure_becomes_error_resolution() {
        let registry = PluginRegistry::<dyn Discoverer>::new(DISCOVERER_NAMESPACE)
            .with_entry("intrinsic", |_| Ok(Box::new(Intrinsic) as Box<dyn Discoverer>))
            .with_entry("broken", |_| Ok(Box::new(Broken) as Box<dyn Discoverer>));
        let discoverer = DiscovererManager::new(&registry, &Config::default()).unwrap();

        let resolutions = discoverer.discover().unwrap();
        assert_eq!(resolutions.len(), 2);

        // Sorted by name: "broken" first
        assert_eq!(resolutions[0].result(), ReferenceResolutionResult::Error);
        assert_eq!(resolutions[0].origin(), "broken");
        assert_eq!(resolutions[0].reference(), "");
        assert_eq!(resolutions[0].info(), Some("cannot list"));

        assert!(resolutions[1].is_success());
        assert_eq!(resolutions[1].origin(), "intrinsic");
        assert_eq!(resolutions[1].resolutions()[0].uri(), None);
    }
}

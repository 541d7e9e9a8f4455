//! Reference resolution
//!
//! The [`ResolverManager`] offers each reference to the resolver plugins in
//! priority order and stops according to the resolution policy. Plugins
//! share the helpers in [`reference`]; directory references are expanded
//! with [`extend_directory`] and hint files are read by [`HintParser`].

mod directory;
mod discoverer;
mod hint;
pub mod reference;

pub use directory::extend_directory;
pub use discoverer::{DISCOVERER_NAMESPACE, DiscovererManager};
pub use hint::{HINT_ORIGIN, HintParser};
pub use reference::{Access, check_file, reference_split};

use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;
use tracing::{debug, error};

use crate::{
    config::Config,
    error::{Error, PluginError, Result},
    extension::{ExtensionManager, PluginRegistry, panic_message},
    interfaces::Resolver,
    types::{ReferenceResolution, ReferenceResolutionAction, ReferenceResolutionResult},
};

/// Namespace resolver plugins are registered under
pub const RESOLVER_NAMESPACE: &str = "resolver";

/// Action taken after each outcome
pub const DEFAULT_POLICY: [(ReferenceResolutionResult, ReferenceResolutionAction); 3] = [
    (ReferenceResolutionResult::Success, ReferenceResolutionAction::Return),
    (ReferenceResolutionResult::NotFound, ReferenceResolutionAction::Continue),
    (ReferenceResolutionResult::Error, ReferenceResolutionAction::Continue),
];

/// Look `result` up in [`DEFAULT_POLICY`], continuing when absent
pub fn policy_action(result: ReferenceResolutionResult) -> ReferenceResolutionAction {
    DEFAULT_POLICY
        .iter()
        .find(|(outcome, _)| *outcome == result)
        .map(|(_, action)| *action)
        .unwrap_or(ReferenceResolutionAction::Continue)
}

/// Resolves references with the enabled resolver plugins
pub struct ResolverManager {
    manager: ExtensionManager<dyn Resolver>,
}

impl ResolverManager {
    pub fn new(registry: &PluginRegistry<dyn Resolver>, config: &Config) -> Result<Self> {
        Ok(Self {
            manager: ExtensionManager::new(registry, config)?,
        })
    }

    pub fn extensions(&self) -> &ExtensionManager<dyn Resolver> {
        &self.manager
    }

    /// Every resolution produced for `reference`, in plugin order.
    ///
    /// A plugin failure becomes an `Error` resolution and the next
    /// plugin is tried. Exit and interrupt requests are returned.
    pub fn resolve(&self, reference: &str) -> Result<Vec<ReferenceResolution>> {
        let mut resolutions = Vec::new();

        for ext in self.manager.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| ext.obj().resolve(reference)))
                .unwrap_or_else(|payload| {
                    Err(PluginError::Failed(anyhow!(
                        "panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
            let resolution = match outcome {
                Ok(mut resolution) => {
                    resolution.stamp_origin(ext.name());
                    resolution
                }
                Err(PluginError::Failed(e)) => {
                    error!("Resolver \"{}\" failed on \"{}\": {:#}", ext.name(), reference, e);
                    debug!("{:?}", e);
                    ReferenceResolution::error(reference, format!("{e:#}")).with_origin(ext.name())
                }
                Err(PluginError::Exit(code)) => return Err(Error::Exit(code)),
                Err(PluginError::Interrupted) => return Err(Error::Interrupted),
            };

            let action = policy_action(resolution.result());
            debug!(
                "Resolver \"{}\" gave {} for \"{}\"",
                ext.name(),
                resolution.result(),
                reference
            );
            resolutions.push(resolution);
            if action == ReferenceResolutionAction::Return {
                break;
            }
        }

        Ok(resolutions)
    }
}

//! Plugin interfaces for quarry
//!
//! Every plugin kind is a trait object behind an [`ExtensionManager`].
//! Methods return [`PluginResult`] so the manager can tell contained
//! failures from exit and interrupt requests.
//!
//! [`ExtensionManager`]: crate::extension::ExtensionManager

use std::path::PathBuf;

use crate::{error::PluginResult, types::ReferenceResolution};

/// Identity shared by every plugin kind
pub trait Plugin: Send + Sync {
    /// Short identifier
    fn name(&self) -> &str;

    /// One-line human description
    fn description(&self) -> &str;
}

/// Turns a reference into runnables
pub trait Resolver: Plugin {
    /// Resolve a single reference.
    ///
    /// A resolution whose `origin` is empty is stamped with the plugin's
    /// extension name by the caller.
    fn resolve(&self, reference: &str) -> PluginResult<ReferenceResolution>;
}

/// Produces runnables without any reference
pub trait Discoverer: Plugin {
    fn discover(&self) -> PluginResult<Vec<ReferenceResolution>>;
}

/// Adjusts configuration search paths before settings are read
pub trait SettingsPlugin: Plugin {
    fn adjust_settings_paths(&self, paths: &mut Vec<PathBuf>) -> PluginResult<()>;
}

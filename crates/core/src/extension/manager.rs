//! Extension manager
//!
//! Realizes every entry point of a namespace, keeps the enabled ones in a
//! deterministic order and runs plugin methods with failure isolation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use super::registry::{Factory, FactoryError, PluginRegistry};
use crate::{
    config::Config,
    error::{Error, PluginError, PluginResult, Result},
    interfaces::Plugin,
};

/// Default namespace prefix stripped when computing the plugin type
pub const NAMESPACE_PREFIX: &str = "quarry.plugins.";

/// Settings namespace listing fully-qualified plugins to skip
pub const DISABLE_NAMESPACE: &str = "plugins.disable";

/// A loaded plugin, valid for the lifetime of its manager
pub struct Extension<P: ?Sized> {
    name: String,
    namespace: String,
    plugin: Factory<P>,
    obj: Box<P>,
}

impl<P: ?Sized> Extension<P> {
    /// Short name advertised by the entry point
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace of the entry point
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The factory the plugin was realized from
    pub fn plugin(&self) -> &Factory<P> {
        &self.plugin
    }

    /// The plugin instance
    pub fn obj(&self) -> &P {
        &self.obj
    }
}

/// A plugin that could not be realized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub namespace: String,
    pub name: String,
    pub error: String,
}

pub struct ExtensionManager<P: ?Sized> {
    namespace: String,
    extensions: Vec<Extension<P>>,
    load_failures: Vec<LoadFailure>,
}

impl<P: Plugin + ?Sized> ExtensionManager<P> {
    /// Load every enabled plugin of `registry`.
    ///
    /// A plugin is enabled unless its fully-qualified name is listed in
    /// `plugins.disable`.
    pub fn new(registry: &PluginRegistry<P>, config: &Config) -> Result<Self> {
        let plugin_type = plugin_type(registry.namespace()).to_string();
        let disabled = config.get_list(DISABLE_NAMESPACE);
        Self::with_enabled(registry, config, |ext| {
            let qualified = format!("{}.{}", plugin_type, ext.name());
            !disabled.contains(&qualified)
        })
    }

    /// Load plugins, keeping those accepted by `enabled`
    pub fn with_enabled<F>(registry: &PluginRegistry<P>, config: &Config, enabled: F) -> Result<Self>
    where
        F: Fn(&Extension<P>) -> bool,
    {
        let mut extensions = Vec::new();
        let mut load_failures = Vec::new();

        for entry in registry.entries() {
            let obj = match (entry.factory())(config) {
                Ok(obj) => obj,
                Err(FactoryError::Load(reason)) => {
                    warn!(
                        "Failed to load plugin \"{}\" from namespace \"{}\": {}",
                        entry.name(),
                        entry.namespace(),
                        reason
                    );
                    load_failures.push(LoadFailure {
                        namespace: entry.namespace().to_string(),
                        name: entry.name().to_string(),
                        error: reason,
                    });
                    continue;
                }
                Err(FactoryError::Instantiate(e)) => {
                    return Err(Error::PluginInstantiation {
                        name: entry.name().to_string(),
                        reason: format!("{e:#}"),
                    });
                }
            };

            let extension = Extension {
                name: entry.name().to_string(),
                namespace: entry.namespace().to_string(),
                plugin: entry.factory().clone(),
                obj,
            };
            if enabled(&extension) {
                extensions.push(extension);
            } else {
                debug!("Plugin \"{}\" is disabled", extension.name);
            }
        }

        extensions.sort_by(|a, b| a.name.cmp(&b.name));

        let order_namespace = format!("plugins.{}.order", plugin_type(registry.namespace()));
        let extensions = apply_order(extensions, config.get_list(&order_namespace));

        debug!(
            "Loaded {} plugins for namespace \"{}\": {:?}",
            extensions.len(),
            registry.namespace(),
            extensions.iter().map(|e| e.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            namespace: registry.namespace().to_string(),
            extensions,
            load_failures,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Namespace with the standard prefix removed
    pub fn plugin_type(&self) -> &str {
        plugin_type(&self.namespace)
    }

    /// `<type>.<name>`, as used by `plugins.disable`
    pub fn fully_qualified_name(&self, extension: &Extension<P>) -> String {
        format!("{}.{}", self.plugin_type(), extension.name())
    }

    /// Config section holding options for this plugin type
    pub fn settings_section(&self) -> String {
        format!("plugins.{}", self.plugin_type())
    }

    /// Extensions in traversal order
    pub fn extensions(&self) -> &[Extension<P>] {
        &self.extensions
    }

    /// Extension names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extensions.iter().map(|e| e.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn load_failures(&self) -> &[LoadFailure] {
        &self.load_failures
    }

    /// Look an extension up by name
    pub fn get(&self, name: &str) -> Result<&Extension<P>> {
        self.extensions
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::ExtensionNotFound {
                namespace: self.namespace.clone(),
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extension<P>> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Call `method` on every extension.
    ///
    /// Plugin failures (errors and panics) are logged and skipped. Exit
    /// and interrupt requests stop the traversal and are returned.
    pub fn map_method<F>(&self, method: &str, mut call: F) -> Result<()>
    where
        F: FnMut(&P) -> PluginResult<()>,
    {
        for ext in &self.extensions {
            invoke(ext, method, || call(ext.obj()))?;
        }
        Ok(())
    }

    /// Like [`map_method`](Self::map_method), collecting return values of
    /// the plugins that did not fail
    pub fn map_method_with_return<T, F>(&self, method: &str, mut call: F) -> Result<Vec<T>>
    where
        F: FnMut(&P) -> PluginResult<T>,
    {
        let mut results = Vec::with_capacity(self.extensions.len());
        for ext in &self.extensions {
            if let Some(value) = invoke(ext, method, || call(ext.obj()))? {
                results.push(value);
            }
        }
        Ok(results)
    }

    /// Like [`map_method_with_return`](Self::map_method_with_return), but
    /// every plugin receives its own copy of `args`
    pub fn map_method_with_copies<A, T, F>(&self, method: &str, args: &A, mut call: F) -> Result<Vec<T>>
    where
        A: Clone,
        F: FnMut(&P, A) -> PluginResult<T>,
    {
        let mut results = Vec::with_capacity(self.extensions.len());
        for ext in &self.extensions {
            let copy = args.clone();
            if let Some(value) = invoke(ext, method, || call(ext.obj(), copy))? {
                results.push(value);
            }
        }
        Ok(results)
    }
}

impl<'a, P: ?Sized> IntoIterator for &'a ExtensionManager<P> {
    type Item = &'a Extension<P>;
    type IntoIter = std::slice::Iter<'a, Extension<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.extensions.iter()
    }
}

/// Strip [`NAMESPACE_PREFIX`] from a namespace
pub fn plugin_type(namespace: &str) -> &str {
    namespace.strip_prefix(NAMESPACE_PREFIX).unwrap_or(namespace)
}

/// Move the extensions named in `order` to the front, in that order.
///
/// Names that match no extension are ignored.
fn apply_order<P: ?Sized>(extensions: Vec<Extension<P>>, order: &[String]) -> Vec<Extension<P>> {
    if order.is_empty() {
        return extensions;
    }

    let mut remaining: Vec<Option<Extension<P>>> = extensions.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    for name in order {
        let slot = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|ext| &ext.name == name));
        match slot.and_then(Option::take) {
            Some(ext) => ordered.push(ext),
            None => debug!("Ordered plugin \"{}\" is not installed", name),
        }
    }

    ordered.extend(remaining.into_iter().flatten());
    ordered
}

/// Run one plugin call, containing everything but exit and interrupt
fn invoke<P, T, F>(ext: &Extension<P>, method: &str, call: F) -> Result<Option<T>>
where
    P: ?Sized,
    F: FnOnce() -> PluginResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(Some(value)),
        Ok(Err(PluginError::Exit(code))) => Err(Error::Exit(code)),
        Ok(Err(PluginError::Interrupted)) => Err(Error::Interrupted),
        Ok(Err(PluginError::Failed(e))) => {
            debug!("Plugin \"{}\" failed in \"{}\": {:?}", ext.name(), method, e);
            error!(
                "Error running method \"{}\" of plugin \"{}\": {:#}",
                method,
                ext.name(),
                e
            );
            Ok(None)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(
                "Error running method \"{}\" of plugin \"{}\": panicked: {}",
                method,
                ext.name(),
                message
            );
            Ok(None)
        }
    }
}

/// Text carried by a caught panic
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

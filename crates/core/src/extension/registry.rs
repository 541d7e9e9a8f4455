//! Compile-time plugin registry
//!
//! A registry maps one namespace to an ordered list of named factories.
//! The host application fills it at startup (see
//! [`crate::plugins`]) and extension managers realize it.

use std::fmt;
use std::sync::Arc;

use crate::config::Config;

/// Why a factory could not produce a plugin
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    /// The plugin cannot be realized here (missing tool, unsupported
    /// platform). Recorded as a load failure.
    #[error("{0}")]
    Load(String),

    /// The plugin was realized but its constructor failed. Propagated.
    #[error("{0:#}")]
    Instantiate(anyhow::Error),
}

/// Constructor for a plugin, called with the active configuration
pub type Factory<P> = Arc<dyn Fn(&Config) -> Result<Box<P>, FactoryError> + Send + Sync>;

/// One advertised plugin
pub struct EntryPoint<P: ?Sized> {
    name: String,
    namespace: String,
    factory: Factory<P>,
}

impl<P: ?Sized> EntryPoint<P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn factory(&self) -> &Factory<P> {
        &self.factory
    }
}

impl<P: ?Sized> Clone for EntryPoint<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<P: ?Sized> fmt::Debug for EntryPoint<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.namespace)
    }
}

/// Ordered entry points of one namespace
pub struct PluginRegistry<P: ?Sized> {
    namespace: String,
    entries: Vec<EntryPoint<P>>,
}

impl<P: ?Sized> PluginRegistry<P> {
    /// Create an empty registry for `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            entries: Vec::new(),
        }
    }

    /// Register a new entry point
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Config) -> Result<Box<P>, FactoryError> + Send + Sync + 'static,
    {
        self.entries.push(EntryPoint {
            name: name.into(),
            namespace: self.namespace.clone(),
            factory: Arc::new(factory),
        });
        self
    }

    /// Builder flavour of [`PluginRegistry::register`]
    pub fn with_entry<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Config) -> Result<Box<P>, FactoryError> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Entry points in registration order
    pub fn entries(&self) -> &[EntryPoint<P>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: ?Sized> Clone for PluginRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<P: ?Sized> fmt::Debug for PluginRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("namespace", &self.namespace)
            .field(
                "entries",
                &self.entries.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

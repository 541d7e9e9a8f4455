//! Plugin loading and failure-isolated invocation

mod manager;
pub mod registry;

pub(crate) use manager::panic_message;
pub use manager::{
    DISABLE_NAMESPACE, Extension, ExtensionManager, LoadFailure, NAMESPACE_PREFIX, plugin_type,
};
pub use registry::{EntryPoint, Factory, FactoryError, PluginRegistry};

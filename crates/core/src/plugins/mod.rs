//! Builtin plugins
//!
//! Front ends start from these registries and may register more entries
//! before handing them to the pipeline.

mod discoverers;
mod exec_test;
mod python_unittest;
mod tap;

pub use discoverers::{ResolverDiscoverer, TEST_DIR_NAMESPACE};
pub use exec_test::{EXEC_TEST_KIND, ExecTestResolver};
pub use python_unittest::{
    PYTHON_UNITTEST_KIND, PythonUnittestResolver, TestClass, TestMethod, docstring_directives,
    docstring_tags, find_python_unittests,
};
pub use tap::{TAP_KIND, TAP_SUFFIX, TapResolver};

use crate::{
    extension::PluginRegistry,
    interfaces::{Discoverer, Resolver, SettingsPlugin},
    resolver::{DISCOVERER_NAMESPACE, RESOLVER_NAMESPACE},
};

/// Namespace of the settings contributor plugins
pub const SETTINGS_NAMESPACE: &str = "settings";

/// Builtin resolvers
pub fn resolvers() -> PluginRegistry<dyn Resolver> {
    PluginRegistry::new(RESOLVER_NAMESPACE)
        .with_entry("exec-test", |_| Ok(Box::new(ExecTestResolver) as Box<dyn Resolver>))
        .with_entry("python-unittest", |_| {
            Ok(Box::new(PythonUnittestResolver) as Box<dyn Resolver>)
        })
        .with_entry("tap", |_| Ok(Box::new(TapResolver) as Box<dyn Resolver>))
}

/// Builtin discoverers, one per builtin resolver
pub fn discoverers() -> PluginRegistry<dyn Discoverer> {
    PluginRegistry::new(DISCOVERER_NAMESPACE)
        .with_entry("exec-test-discoverer", |config| {
            Ok(Box::new(ResolverDiscoverer::new(
                "exec-test-discoverer",
                "Test discoverer for executable files to be handled as tests",
                ExecTestResolver,
                config,
            )) as Box<dyn Discoverer>)
        })
        .with_entry("python-unittest-discoverer", |config| {
            Ok(Box::new(ResolverDiscoverer::new(
                "python-unittest-discoverer",
                "Test discoverer for Python Unittests",
                PythonUnittestResolver,
                config,
            )) as Box<dyn Discoverer>)
        })
        .with_entry("tap-discoverer", |config| {
            Ok(Box::new(ResolverDiscoverer::new(
                "tap-discoverer",
                "Test discoverer for executable files producing TAP output",
                TapResolver,
                config,
            )) as Box<dyn Discoverer>)
        })
}

/// Settings contributors; none are builtin
pub fn settings_plugins() -> PluginRegistry<dyn SettingsPlugin> {
    PluginRegistry::new(SETTINGS_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, extension::ExtensionManager};

    #[test]
    fn test_builtin_names() {
        let manager = ExtensionManager::new(&resolvers(), &Config::default()).unwrap();
        assert_eq!(manager.names(), vec!["exec-test", "python-unittest", "tap"]);
        for ext in &manager {
            assert_eq!(ext.name(), ext.obj().name());
        }

        let manager = ExtensionManager::new(&discoverers(), &Config::default()).unwrap();
        assert_eq!(manager.len(), 3);
        assert!(settings_plugins().is_empty());
    }
}

use std::path::PathBuf;

use crate::{
    config::Config,
    error::PluginResult,
    interfaces::{Discoverer, Plugin, Resolver},
    resolver::extend_directory,
    types::ReferenceResolution,
};

/// Settings namespace of the directory walked by the builtin discoverers
pub const TEST_DIR_NAMESPACE: &str = "discoverer.test_dir";

/// Discovers tests by running a resolver over every file of the
/// configured test directory
pub struct ResolverDiscoverer<R> {
    name: &'static str,
    description: &'static str,
    resolver: R,
    test_dir: Option<PathBuf>,
}

impl<R: Resolver> ResolverDiscoverer<R> {
    pub fn new(name: &'static str, description: &'static str, resolver: R, config: &Config) -> Self {
        let test_dir = config
            .get_str(TEST_DIR_NAMESPACE)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        Self {
            name,
            description,
            resolver,
            test_dir,
        }
    }
}

impl<R: Resolver> Plugin for ResolverDiscoverer<R> {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }
}

impl<R: Resolver> Discoverer for ResolverDiscoverer<R> {
    fn discover(&self) -> PluginResult<Vec<ReferenceResolution>> {
        let Some(test_dir) = &self.test_dir else {
            return Ok(Vec::new());
        };
        if !test_dir.is_dir() {
            tracing::debug!("Test directory {:?} does not exist", test_dir);
            return Ok(Vec::new());
        }

        let mut resolutions = Vec::new();
        for path in extend_directory(&test_dir.to_string_lossy()) {
            let resolution = self.resolver.resolve(&path)?;
            if resolution.is_success() {
                resolutions.push(ReferenceResolution::success("", resolution.into_resolutions()));
            }
        }
        Ok(resolutions)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::plugins::ExecTestResolver;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_walks_test_dir() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(temp.path().join("data.txt"), "").unwrap();

        let config = Config::default().with(TEST_DIR_NAMESPACE, temp.path().to_string_lossy().into_owned());
        let discoverer = ResolverDiscoverer::new("exec-test-discoverer", "", ExecTestResolver, &config);
        let resolutions = discoverer.discover().unwrap();

        assert_eq!(resolutions.len(), 1);
        assert_eq!(resolutions[0].reference(), "");
        assert_eq!(
            resolutions[0].resolutions()[0].uri(),
            Some(script.to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_without_test_dir() {
        let discoverer =
            ResolverDiscoverer::new("exec-test-discoverer", "", ExecTestResolver, &Config::default());
        assert!(discoverer.discover().unwrap().is_empty());
    }
}

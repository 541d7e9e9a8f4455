use std::path::Path;

use crate::{
    error::PluginResult,
    interfaces::{Plugin, Resolver},
    resolver::{Access, check_file},
    types::{ReferenceResolution, Runnable},
};

/// Kind of runnables produced for executable files
pub const EXEC_TEST_KIND: &str = "exec-test";

/// Any executable regular file is a test; exit status decides the result
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecTestResolver;

impl Plugin for ExecTestResolver {
    fn name(&self) -> &str {
        "exec-test"
    }

    fn description(&self) -> &str {
        "Test resolver for executable files to be handled as tests"
    }
}

impl Resolver for ExecTestResolver {
    fn resolve(&self, reference: &str) -> PluginResult<ReferenceResolution> {
        if let Err(not_found) = check_file(Path::new(reference), reference, None, Access::Executable) {
            return Ok(not_found);
        }
        Ok(ReferenceResolution::success(
            reference,
            vec![Runnable::new(EXEC_TEST_KIND, reference)],
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::types::ReferenceResolutionResult;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_executable_file() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("check.sh");
        fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        let reference = script.to_string_lossy().into_owned();

        let resolution = ExecTestResolver.resolve(&reference).unwrap();
        assert_eq!(resolution.result(), ReferenceResolutionResult::NotFound);

        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let resolution = ExecTestResolver.resolve(&reference).unwrap();
        assert!(resolution.is_success());
        assert_eq!(resolution.resolutions(), &[Runnable::new("exec-test", reference.as_str())]);
    }

    #[test]
    fn test_missing_file() {
        let resolution = ExecTestResolver.resolve("/does/not/exist").unwrap();
        assert_eq!(resolution.result(), ReferenceResolutionResult::NotFound);
        assert!(resolution.info().is_some());
    }
}

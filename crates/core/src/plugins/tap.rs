use std::path::Path;

use crate::{
    error::PluginResult,
    interfaces::{Plugin, Resolver},
    resolver::{Access, check_file},
    types::{ReferenceResolution, Runnable},
};

pub const TAP_KIND: &str = "tap";

/// File suffix of TAP producing executables
pub const TAP_SUFFIX: &str = ".t";

/// Executables whose output follows the Test Anything Protocol
#[derive(Debug, Default, Clone, Copy)]
pub struct TapResolver;

impl Plugin for TapResolver {
    fn name(&self) -> &str {
        "tap"
    }

    fn description(&self) -> &str {
        "Test resolver for executable files producing TAP output"
    }
}

impl Resolver for TapResolver {
    fn resolve(&self, reference: &str) -> PluginResult<ReferenceResolution> {
        let path = Path::new(reference);
        if let Err(not_found) = check_file(path, reference, Some(TAP_SUFFIX), Access::Executable) {
            return Ok(not_found);
        }
        Ok(ReferenceResolution::success(
            reference,
            vec![Runnable::new(TAP_KIND, reference)],
        ))
    }
}

//! Helpers shared by resolver plugins

use std::fs;
use std::path::Path;

use crate::types::ReferenceResolution;

/// Access a file must grant before a resolver accepts it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Readable,
    Executable,
}

impl Access {
    fn name(self) -> &'static str {
        match self {
            Access::Readable => "readable",
            Access::Executable => "executable",
        }
    }
}

/// Split `path:selector` into its parts.
///
/// The split happens at the last colon, and only when something precedes
/// it, so `:foo` and plain paths come back without a selector.
pub fn reference_split(reference: &str) -> (&str, Option<&str>) {
    match reference.rsplit_once(':') {
        Some((path, selector)) if !path.is_empty() => (path, Some(selector)),
        _ => (reference, None),
    }
}

/// Check that `path` is a regular file with `suffix` and `access`.
///
/// On failure returns the `NotFound` resolution (with a diagnostic) that
/// the resolver should hand back for `reference`.
pub fn check_file(
    path: &Path,
    reference: &str,
    suffix: Option<&str>,
    access: Access,
) -> Result<(), ReferenceResolution> {
    if let Some(suffix) = suffix
        && !path.to_string_lossy().ends_with(suffix)
    {
        return Err(ReferenceResolution::not_found(reference).with_info(format!(
            "File path \"{}\" does not end with \"{}\"",
            path.display(),
            suffix
        )));
    }

    let metadata = match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => {
            return Err(ReferenceResolution::not_found(reference).with_info(format!(
                "File \"{}\" does not exist or is not a regular file",
                path.display()
            )));
        }
    };

    if !has_access(path, &metadata, access) {
        return Err(ReferenceResolution::not_found(reference).with_info(format!(
            "File \"{}\" does not exist or is not {}",
            path.display(),
            access.name()
        )));
    }

    Ok(())
}

#[cfg(unix)]
fn has_access(path: &Path, metadata: &fs::Metadata, access: Access) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match access {
        Access::Readable => fs::File::open(path).is_ok(),
        Access::Executable => metadata.permissions().mode() & 0o111 != 0,
    }
}

#[cfg(not(unix))]
fn has_access(path: &Path, _metadata: &fs::Metadata, access: Access) -> bool {
    match access {
        Access::Readable => fs::File::open(path).is_ok(),
        Access::Executable => path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe") || ext.eq_ignore_ascii_case("bat")),
    }
}

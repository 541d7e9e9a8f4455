//! Configuration file search locations

use std::path::{Path, PathBuf};

/// Name of the main configuration file
pub const CONFIG_FILENAME: &str = "quarry.conf";

/// Environment variable that relocates both the system and user roots
pub const PREFIX_ENV: &str = "QUARRY_PREFIX";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub system_file: PathBuf,
    pub system_extra_dir: PathBuf,
    pub user_dir: PathBuf,
    pub user_file: PathBuf,
}

impl ConfigPaths {
    /// Locations derived from `QUARRY_PREFIX`, falling back to `/etc` and `$HOME`
    pub fn discover() -> Self {
        let (sysconf, user_root) = match std::env::var(PREFIX_ENV) {
            Ok(prefix) if !prefix.is_empty() => {
                let prefix = PathBuf::from(prefix);
                (prefix.join("etc"), prefix)
            }
            _ => {
                let home = std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("."));
                (PathBuf::from("/etc"), home)
            }
        };
        Self::from_roots(&sysconf, &user_root)
    }

    /// Locations under explicit system and user roots
    pub fn from_roots(sysconf_dir: &Path, user_root: &Path) -> Self {
        let system_dir = sysconf_dir.join("quarry");
        let user_dir = user_root.join(".config").join("quarry");
        Self {
            system_file: system_dir.join(CONFIG_FILENAME),
            system_extra_dir: system_dir.join("conf.d"),
            user_file: user_dir.join(CONFIG_FILENAME),
            user_dir,
        }
    }

    /// The system file followed by the `conf.d/*.conf` drop-ins, sorted
    pub fn system_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.system_file.clone()];

        let pattern = self.system_extra_dir.join("*.conf");
        let mut extras: Vec<PathBuf> = match glob::glob(&pattern.to_string_lossy()) {
            Ok(entries) => entries.filter_map(|entry| entry.ok()).collect(),
            Err(e) => {
                tracing::warn!("Invalid drop-in pattern {:?}: {}", pattern, e);
                Vec::new()
            }
        };
        extras.sort();
        paths.extend(extras);
        paths
    }

    /// Create an empty user configuration file if there is none.
    ///
    /// Failures (read-only homes, containers) are ignored.
    pub fn ensure_user_file(&self) {
        if self.user_file.exists() {
            return;
        }
        let content = format!(
            "# You can use this file to override configuration values from '{} and {}'\n",
            self.system_file.display(),
            self.system_extra_dir.display()
        );
        let created = std::fs::create_dir_all(&self.user_dir)
            .and_then(|_| std::fs::write(&self.user_file, content));
        if let Err(e) = created {
            tracing::debug!("Could not create {:?}: {}", self.user_file, e);
        }
    }
}

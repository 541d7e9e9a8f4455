use std::io;
use std::path::PathBuf;

/// Errors that can occur during quarry operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Key \"{key}\" already registered under section \"{section}\"")]
    DuplicatedNamespace { section: String, key: String },

    #[error("Namespace not found: {0}")]
    NamespaceNotRegistered(String),

    #[error("Parser already registered for namespace {0}")]
    ParserAlreadyRegistered(String),

    #[error("Could not convert value {value:?} for {namespace}: {reason}")]
    SettingsValue {
        namespace: String,
        value: String,
        reason: String,
    },

    #[error("Could not find the quarry config file after looking in: {0:?}")]
    ConfigFileNotFound(Vec<PathBuf>),

    #[error("Parse error in {path}:{line}: {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Hint file error: {0}")]
    HintError(String),

    #[error("Could not resolve references: {}", .0.join(","))]
    MissingReferences(Vec<String>),

    #[error("No extension named \"{name}\" in namespace \"{namespace}\"")]
    ExtensionNotFound { namespace: String, name: String },

    #[error("Failed to instantiate plugin \"{name}\": {reason}")]
    PluginInstantiation { name: String, reason: String },

    #[error("Program exit requested with code {0}")]
    Exit(i32),

    #[error("Interrupted by the user")]
    Interrupted,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for quarry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by plugin methods.
///
/// `Exit` and `Interrupted` always travel up to the caller; `Failed` is
/// contained by the extension manager that invoked the plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("exit requested with code {0}")]
    Exit(i32),

    #[error("interrupted")]
    Interrupted,

    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl PluginError {
    /// Whether this error must stop plugin traversal.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, PluginError::Exit(_) | PluginError::Interrupted)
    }
}

impl From<anyhow::Error> for PluginError {
    fn from(err: anyhow::Error) -> Self {
        PluginError::Failed(err)
    }
}

impl From<Error> for PluginError {
    fn from(err: Error) -> Self {
        match err {
            Error::Exit(code) => PluginError::Exit(code),
            Error::Interrupted => PluginError::Interrupted,
            other => PluginError::Failed(anyhow::Error::new(other)),
        }
    }
}

impl From<io::Error> for PluginError {
    fn from(err: io::Error) -> Self {
        PluginError::Failed(err.into())
    }
}

/// Result type returned by plugin methods
pub type PluginResult<T> = std::result::Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_references_message() {
        let err = Error::MissingReferences(vec!["/a.py".into(), "/b.py".into()]);
        assert_eq!(err.to_string(), "Could not resolve references: /a.py,/b.py");
    }

    #[test]
    fn test_sentinels_survive_conversion() {
        assert!(matches!(PluginError::from(Error::Exit(3)), PluginError::Exit(3)));
        assert!(PluginError::from(Error::Interrupted).is_sentinel());
        assert!(!PluginError::from(Error::Other("x".into())).is_sentinel());
    }
}

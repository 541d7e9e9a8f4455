use serde::Serialize;
use std::fmt;

use super::runnable::Runnable;

/// Outcome of resolving one reference with one plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceResolutionResult {
    /// The reference was resolved into one or more runnables
    Success,
    /// The plugin does not recognise the reference
    #[serde(rename = "NOTFOUND")]
    NotFound,
    /// The plugin failed while looking at the reference
    Error,
}

impl fmt::Display for ReferenceResolutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReferenceResolutionResult::Success => "SUCCESS",
            ReferenceResolutionResult::NotFound => "NOTFOUND",
            ReferenceResolutionResult::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// What the resolver does after observing a given result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceResolutionAction {
    /// Stop trying to resolve the reference
    Return,
    /// Offer the reference to the next plugin
    Continue,
}

/// One complete reference resolution.
///
/// Only successful resolutions carry runnables, and a successful
/// resolution always carries at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceResolution {
    reference: String,
    result: ReferenceResolutionResult,
    resolutions: Vec<Runnable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<String>,
    origin: String,
}

impl ReferenceResolution {
    /// A successful resolution.
    ///
    /// An empty runnable list cannot be a success and is recorded as
    /// `NotFound` instead.
    pub fn success(reference: impl Into<String>, resolutions: Vec<Runnable>) -> Self {
        if resolutions.is_empty() {
            return Self::not_found(reference).with_info("no runnables were produced");
        }
        Self {
            reference: reference.into(),
            result: ReferenceResolutionResult::Success,
            resolutions,
            info: None,
            origin: String::new(),
        }
    }

    pub fn not_found(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            result: ReferenceResolutionResult::NotFound,
            resolutions: Vec::new(),
            info: None,
            origin: String::new(),
        }
    }

    pub fn error(reference: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            result: ReferenceResolutionResult::Error,
            resolutions: Vec::new(),
            info: Some(info.into()),
            origin: String::new(),
        }
    }

    /// Builder method for the diagnostic text
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Builder method for the producing plugin's name
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the origin when the plugin left it empty
    pub(crate) fn stamp_origin(&mut self, origin: &str) {
        if self.origin.is_empty() {
            self.origin = origin.to_string();
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn result(&self) -> ReferenceResolutionResult {
        self.result
    }

    pub fn is_success(&self) -> bool {
        self.result == ReferenceResolutionResult::Success
    }

    pub fn resolutions(&self) -> &[Runnable] {
        &self.resolutions
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Consume the resolution and hand back its runnables
    pub fn into_resolutions(self) -> Vec<Runnable> {
        self.resolutions
    }
}

//! quarry-core - Test reference resolution and suite assembly
//!
//! This crate provides functionality to:
//! - Register plugins and run them with failure isolation
//! - Layer settings from defaults, INI configuration files and the command line
//! - Resolve test references into runnables through resolver plugins
//! - Discover runnables without references and filter them by tags
pub mod config;
pub mod error;
pub mod extension;
pub mod interfaces;
pub mod orchestrator;
pub mod plugins;
pub mod resolver;
pub mod tags;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Error, PluginError, PluginResult, Result};
pub use types::*;

// Re-export main API components
pub use config::{Config, Settings};
pub use extension::{ExtensionManager, PluginRegistry};
pub use interfaces::{Discoverer, Plugin, Resolver, SettingsPlugin};
pub use orchestrator::Orchestrator;
pub use resolver::{DiscovererManager, ResolverManager};
pub use tags::TagFilter;

//! Core interfaces for the plugin architecture
//!
//! The traits here are the stable surface plugins implement; the CLI
//! crate adds its own command plugin traits on top of the same
//! extension machinery.

pub mod plugin;

pub use plugin::{Discoverer, Plugin, Resolver, SettingsPlugin};

//! Service Configuration Module
//!
//! Provides deployment configuration loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `TUNNELVISION_CONFIG` environment variable (path to TOML file)
//! 2. `tunnelvision.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded [`ServiceConfig`] is handed to startup code explicitly; nothing
//! reads configuration through globals.

mod service_config;
pub mod defaults;
pub mod validation;

pub use service_config::*;

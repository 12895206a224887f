//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and loading
//! - [`defaults`]: serde default value functions
//! - [`validation`]: startup validation collecting every error found

mod defaults;
mod types;
mod validation;

pub use types::{Config, ConsoleConfig, LoggingConfig};
pub use validation::validate;

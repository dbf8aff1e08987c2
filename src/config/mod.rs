// src/config/mod.rs

//! Configuration for tfpilot.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load the optional config file and apply environment and CLI
//!   overrides (`loader.rs`).
//! - Validate the result (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{ConfigOverrides, default_config_path, load_config, load_from_path};
pub use model::{ConfigFile, ConfigSection, ModulesSection, RawConfigFile};
pub use validate::validate_config;

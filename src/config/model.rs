// src/config/model.rs

use serde::Deserialize;

use crate::parallel::{DEFAULT_ALL_MARKER, DEFAULT_MAX_WORKERS, DEFAULT_MODULE_MARKERS};
use crate::types::Answer;

/// Configuration as read from TOML, before overrides and validation.
///
/// ```toml
/// [config]
/// executable = "terragrunt"
/// parallelism = 5
/// default_answer = "n"
/// all_marker = "--all"
///
/// [modules]
/// markers = ["terragrunt.hcl", "*.tf", "*.tf.json"]
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub modules: ModulesSection,
}

/// Validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub modules: ModulesSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, modules: ModulesSection) -> Self {
        Self { config, modules }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Tool to drive (`terragrunt`, `terraform`, `tofu`, ...).
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Upper bound on concurrent children for fleet-wide operations.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Answer typed into generic yes/no prompts.
    #[serde(default)]
    pub default_answer: Answer,

    /// Argument that requests "every module"; stripped before each
    /// per-module run.
    #[serde(default = "default_all_marker")]
    pub all_marker: String,
}

fn default_executable() -> String {
    "terragrunt".to_string()
}

fn default_parallelism() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_all_marker() -> String {
    DEFAULT_ALL_MARKER.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            parallelism: default_parallelism(),
            default_answer: Answer::default(),
            all_marker: default_all_marker(),
        }
    }
}

/// `[modules]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesSection {
    /// File-name globs; a directory directly containing a match is a module.
    #[serde(default = "default_markers")]
    pub markers: Vec<String>,
}

fn default_markers() -> Vec<String> {
    DEFAULT_MODULE_MARKERS.iter().map(|s| s.to_string()).collect()
}

impl Default for ModulesSection {
    fn default() -> Self {
        Self {
            markers: default_markers(),
        }
    }
}

// src/errors.rs

//! Crate-wide error type.
//!
//! Variants follow how a failure is handled rather than where it came from:
//! launch failures are fatal to the call, command failures are per-run (and
//! per-unit in fleet mode), and the batch / reinit variants wrap the outcome
//! of a whole operation.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("failed to launch `{command}`: {reason}")]
    Launch { command: String, reason: String },

    #[error("`{command}` failed in {}{}", .dir.display(), exit_suffix(.code))]
    CommandFailed {
        command: String,
        dir: PathBuf,
        code: Option<i32>,
    },

    #[error("no modules found under {}", .0.display())]
    NoModulesFound(PathBuf),

    #[error("{failed} of {total} modules failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("reinitialization failed ({reinit}); original failure: {original}")]
    ReinitFailed {
        reinit: Box<PilotError>,
        original: Box<PilotError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PilotError {
    /// Exit code of the failed child, if this error carries one.
    ///
    /// For a compound reinit failure the original command's code is used.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            PilotError::CommandFailed { code, .. } => *code,
            PilotError::ReinitFailed { original, .. } => original.exit_code(),
            _ => None,
        }
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!(" (exit code {c})"),
        None => " (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, PilotError>;

// src/types.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::PilotError;

/// One invocation of the underlying tool.
///
/// Built once and never mutated; each request drives exactly one child
/// process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    executable: String,
    arguments: Vec<String>,
    working_directory: PathBuf,
}

impl ExecutionRequest {
    pub fn new<E, I, S, D>(executable: E, arguments: I, working_directory: D) -> Self
    where
        E: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
        D: Into<PathBuf>,
    {
        Self {
            executable: executable.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
            working_directory: working_directory.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The same executable and directory with a different argument list.
    pub fn with_arguments<I, S>(&self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            self.executable.clone(),
            arguments,
            self.working_directory.clone(),
        )
    }

    /// Human-readable command line, used in logs and error messages.
    pub fn display_command(&self) -> String {
        let mut out = self.executable.clone();
        for arg in &self.arguments {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Answer injected into a yes/no prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Answer {
    #[serde(rename = "y", alias = "yes")]
    Yes,
    #[default]
    #[serde(rename = "n", alias = "no")]
    No,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "y",
            Answer::No => "n",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "y" | "yes" => Ok(Answer::Yes),
            "n" | "no" => Ok(Answer::No),
            other => Err(format!("invalid answer: {other} (expected \"y\" or \"n\")")),
        }
    }
}

/// A directory discovered during a fleet-wide operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkUnit {
    pub path: PathBuf,
}

impl WorkUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Result of running one work unit. Sent exactly once per unit.
#[derive(Debug)]
pub struct JobOutcome {
    pub unit: WorkUnit,
    pub error: Option<PilotError>,
}

/// Aggregated outcome of a fleet-wide operation.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: Vec<(WorkUnit, PilotError)>,
}

impl BatchResult {
    pub fn record(&mut self, outcome: JobOutcome) {
        match outcome.error {
            None => self.succeeded += 1,
            Some(err) => self.failed.push((outcome.unit, err)),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

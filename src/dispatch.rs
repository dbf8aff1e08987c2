// src/dispatch.rs

//! Picks which of the three execution paths an invocation takes.

use std::fmt;

use crate::config::ConfigSection;
use crate::parallel::has_all_marker;
use crate::types::Answer;

const STATE_MUTATIONS: &[&str] = &["rm", "mv", "push", "replace-provider"];
const TOP_LEVEL_MUTATIONS: &[&str] = &["import", "taint", "untaint"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// State-mutating command over every module, bounded fan-out.
    Parallel,
    /// PTY session with automatic prompt answers.
    Interactive(Answer),
    /// Plain run with one `init --upgrade` recovery.
    UpgradeRetry,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Parallel => f.write_str("parallel"),
            Mode::Interactive(answer) => write!(f, "interactive (default answer {answer})"),
            Mode::UpgradeRetry => f.write_str("upgrade-retry"),
        }
    }
}

/// Classify `args` (the wrapped tool's arguments).
///
/// Fleet-wide state mutation beats an answer directive: state commands do
/// not prompt, and running them per module is the only way `--all` can be
/// honoured.
pub fn classify(args: &[String], cfg: &ConfigSection, auto_answer: Option<Answer>) -> Mode {
    if is_state_mutation(args) && has_all_marker(args, &cfg.all_marker) {
        return Mode::Parallel;
    }
    match auto_answer {
        Some(answer) => Mode::Interactive(answer),
        None => Mode::UpgradeRetry,
    }
}

/// `state rm|mv|push|replace-provider ...` or `import|taint|untaint ...`.
/// Flags before or between the subcommand words are ignored.
pub fn is_state_mutation(args: &[String]) -> bool {
    let mut positionals = args.iter().map(String::as_str).filter(|a| !a.starts_with('-'));

    match positionals.next() {
        Some("state") => positionals
            .next()
            .is_some_and(|sub| STATE_MUTATIONS.contains(&sub)),
        Some(cmd) => TOP_LEVEL_MUTATIONS.contains(&cmd),
        None => false,
    }
}

// src/prompt/mod.rs

//! Prompt-automation controller.
//!
//! Runs the tool attached to a pseudo-terminal, answers the confirmations
//! it knows about and hands the terminal to the operator at the first
//! confirmation it must not answer itself.
//!
//! - [`ansi`] strips terminal control sequences for display and matching.
//! - [`rules`] is the ordered pattern -> action table.
//! - [`buffer`] bounds the output kept for multi-chunk prompts.
//! - [`automaton`] is the pure per-session state machine.
//! - [`session`] owns the PTY, the input handle and raw-mode handling.
//! - [`controller`] wires them into [`run_interactive`].

pub mod ansi;
pub mod automaton;
pub mod buffer;
pub mod controller;
pub mod rules;
pub mod session;

pub use automaton::{PromptAutomaton, Reaction, SessionMode};
pub use controller::{pump_output, run_interactive, PumpSummary};
pub use rules::{builtin_rules, PromptRule, Reply, RuleAction};
pub use session::{PtySession, TerminalSession};

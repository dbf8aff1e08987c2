// src/prompt/automaton.rs

//! Per-session prompt state machine.
//!
//! Two states: `Automatic` (every chunk is buffered and matched against the
//! rules) and `Manual` (terminal; nothing is matched or answered again).
//! Kept free of I/O so the whole decision table can be driven from tests.

use std::sync::Arc;

use crate::prompt::ansi::clean_text;
use crate::prompt::buffer::PromptBuffer;
use crate::prompt::rules::{evaluate, PromptRule, RuleAction};
use crate::types::Answer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Automatic,
    Manual,
}

/// What the controller should do after a chunk of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    None,
    /// Write `keys` into the PTY.
    Answer { rule: &'static str, keys: String },
    /// Start forwarding the operator's keystrokes.
    EnterManual { rule: &'static str },
}

#[derive(Debug)]
pub struct PromptAutomaton {
    rules: Arc<[PromptRule]>,
    default_answer: Answer,
    buffer: PromptBuffer,
    mode: SessionMode,
}

impl PromptAutomaton {
    pub fn new(rules: Arc<[PromptRule]>, default_answer: Answer) -> Self {
        Self {
            rules,
            default_answer,
            buffer: PromptBuffer::new(),
            mode: SessionMode::Automatic,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Text currently buffered for matching, control sequences stripped.
    pub fn buffered_text(&self) -> String {
        clean_text(self.buffer.as_bytes())
    }

    /// Feed one raw chunk of PTY output.
    pub fn on_output(&mut self, chunk: &[u8]) -> Reaction {
        if self.mode == SessionMode::Manual {
            return Reaction::None;
        }

        self.buffer.push(chunk);
        let text = clean_text(self.buffer.as_bytes());

        let Some(rule) = evaluate(&self.rules, &text) else {
            return Reaction::None;
        };

        match rule.action() {
            RuleAction::Answer(reply) => {
                // Clearing guarantees the same prompt text is answered once.
                self.buffer.clear();
                let answer = reply.resolve(self.default_answer);
                Reaction::Answer {
                    rule: rule.name(),
                    keys: format!("{answer}\r"),
                }
            }
            RuleAction::SwitchToManual => {
                self.mode = SessionMode::Manual;
                self.buffer.clear();
                Reaction::EnterManual { rule: rule.name() }
            }
        }
    }
}

// src/prompt/rules.rs

//! Prompt rules: which confirmation texts are answered automatically and
//! which one hands the session over to the operator.
//!
//! Rules are evaluated in order against the accumulated, control-sequence
//! stripped output; the first match wins. Evaluation is a pure function of
//! the text, independent of the PTY.

use std::fmt;

use regex::Regex;

use crate::types::Answer;

/// Shape shared by yes/no prompts: `(y/n)`, `[y/N]`, `(yes/no)` at the end
/// of the output, optionally followed by a colon.
const YES_NO_TAIL: &str = r"(?:\(y/n\)|\[y/n\]|\(yes/no\))\s*:?\s*$";

/// What to type into the PTY for an answering rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Always this answer, whatever the session default is.
    Fixed(Answer),
    /// The session's configured default answer.
    SessionDefault,
}

impl Reply {
    pub fn resolve(self, default_answer: Answer) -> Answer {
        match self {
            Reply::Fixed(answer) => answer,
            Reply::SessionDefault => default_answer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Answer(Reply),
    SwitchToManual,
}

#[derive(Clone)]
pub struct PromptRule {
    name: &'static str,
    pattern: Regex,
    action: RuleAction,
}

impl fmt::Debug for PromptRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("action", &self.action)
            .finish()
    }
}

impl PromptRule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        action: RuleAction,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            action,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// The built-in rule table, in evaluation order.
///
/// 1. External-dependency confirmation: always declined. Anchored on the
///    same answer tail as rule 3, so a question whose `(y/n)` arrives in a
///    later read is matched once, by this rule.
/// 2. "Are you sure you want to run ..." (the run-all confirmation): the
///    operator decides.
/// 3. Any other yes/no prompt: the session default.
pub fn builtin_rules() -> Result<Vec<PromptRule>, regex::Error> {
    Ok(vec![
        PromptRule::new(
            "external-dependency",
            &format!(r"(?is)external dependenc(?:y|ies)\?.*{YES_NO_TAIL}"),
            RuleAction::Answer(Reply::Fixed(Answer::No)),
        )?,
        PromptRule::new(
            "run-confirmation",
            r"(?i)are you sure you want to run",
            RuleAction::SwitchToManual,
        )?,
        PromptRule::new(
            "yes-no",
            &format!("(?i){YES_NO_TAIL}"),
            RuleAction::Answer(Reply::SessionDefault),
        )?,
    ])
}

/// First rule matching `text`, if any.
pub fn evaluate<'r>(rules: &'r [PromptRule], text: &str) -> Option<&'r PromptRule> {
    rules.iter().find(|rule| rule.matches(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<PromptRule> {
        builtin_rules().unwrap()
    }

    #[test]
    fn external_dependency_wins_over_generic_yes_no() {
        let rules = rules();
        let text = "Module /live/app depends on module /live/vpc, which is an external \
                    dependency outside of the current working directory. Should Terragrunt \
                    apply the external dependency? (y/n) ";

        let rule = evaluate(&rules, text).unwrap();
        assert_eq!(rule.name(), "external-dependency");
        assert_eq!(rule.action(), RuleAction::Answer(Reply::Fixed(Answer::No)));
    }

    #[test]
    fn external_dependency_is_case_insensitive() {
        let rules = rules();
        let rule = evaluate(&rules, "APPLY THE EXTERNAL DEPENDENCY? (Y/N)").unwrap();
        assert_eq!(rule.name(), "external-dependency");
    }

    #[test]
    fn external_dependency_question_without_tail_matches_nothing() {
        let rules = rules();
        assert!(evaluate(&rules, "Should Terragrunt apply the external dependency?").is_none());
    }

    #[test]
    fn external_dependency_spanning_lines() {
        let rules = rules();
        let text = "Should Terragrunt apply the external dependency?\r\n(y/n) ";
        assert_eq!(evaluate(&rules, text).unwrap().name(), "external-dependency");
    }

    #[test]
    fn run_confirmation_switches_to_manual() {
        let rules = rules();
        let text = "Are you sure you want to run 'terragrunt apply' in each folder of the \
                    stack described above? (y/n) ";

        let rule = evaluate(&rules, text).unwrap();
        assert_eq!(rule.action(), RuleAction::SwitchToManual);
    }

    #[test]
    fn generic_prompt_shapes_use_session_default() {
        let rules = rules();
        for text in [
            "Do you want to continue? (y/n) ",
            "Remove the lock? [y/N]: ",
            "Proceed (yes/no)\r\n",
        ] {
            let rule = evaluate(&rules, text).unwrap_or_else(|| panic!("no match for {text:?}"));
            assert_eq!(rule.action(), RuleAction::Answer(Reply::SessionDefault));
        }
    }

    #[test]
    fn prompt_must_be_at_end_of_output() {
        let rules = rules();
        assert!(evaluate(&rules, "Continue? (y/n) y\r\nRefreshing state...\r\n").is_none());
    }

    #[test]
    fn ordinary_output_matches_nothing() {
        let rules = rules();
        assert!(evaluate(&rules, "Plan: 3 to add, 0 to change, 0 to destroy.\r\n").is_none());
    }

    #[test]
    fn reply_resolution() {
        assert_eq!(Reply::Fixed(Answer::No).resolve(Answer::Yes), Answer::No);
        assert_eq!(Reply::SessionDefault.resolve(Answer::Yes), Answer::Yes);
    }
}

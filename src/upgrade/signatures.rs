// src/upgrade/signatures.rs

//! Output fragments meaning "run `init --upgrade` first".
//!
//! Matched case-insensitively as substrings of the captured transcript,
//! after control sequences are stripped (the tool colours its errors).

use crate::prompt::ansi::clean_text;

/// Checked in order; the first hit is reported.
pub const UPGRADE_SIGNATURES: &[&str] = &[
    "working directory is not initialized",
    "has not been initialized",
    "backend initialization required",
    "backend configuration changed",
    "backend configuration has changed",
    "does not match configured version constraint",
    "no available releases match the given constraints",
    "required plugins are not installed",
    "module not installed",
    "inconsistent dependency lock file",
    "dependency lock file",
    "init -upgrade",
    "init --upgrade",
    "please run \"terraform init\"",
    "please run \"tofu init\"",
];

/// First signature contained in `output`, if any.
pub fn find_upgrade_signature(output: &str) -> Option<&'static str> {
    let haystack = clean_text(output.as_bytes()).to_lowercase();
    UPGRADE_SIGNATURES
        .iter()
        .copied()
        .find(|sig| haystack.contains(sig))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_lock_file_error() {
        let out = "\x1b[31m╷\x1b[0m\n\x1b[31m│\x1b[0m \x1b[1;31mError: \x1b[0m\x1b[1mInconsistent dependency lock file\x1b[0m\n";
        assert_eq!(
            find_upgrade_signature(out),
            Some("inconsistent dependency lock file")
        );
    }

    #[test]
    fn matches_backend_change_case_insensitively() {
        assert_eq!(
            find_upgrade_signature("Error: Backend configuration changed"),
            Some("backend configuration changed")
        );
    }

    #[test]
    fn matches_explicit_upgrade_hint() {
        let out = "To upgrade to the newest version, run:\n  terraform init -upgrade\n";
        assert_eq!(find_upgrade_signature(out), Some("init -upgrade"));
    }

    #[test]
    fn unrelated_failure_does_not_match() {
        assert_eq!(
            find_upgrade_signature("Error: Invalid reference\n  on main.tf line 3"),
            None
        );
    }
}

// src/parallel/args.rs

//! Argument handling for fleet-wide runs.

/// Default "apply to all modules" marker.
pub const DEFAULT_ALL_MARKER: &str = "--all";

pub fn has_all_marker(args: &[String], marker: &str) -> bool {
    args.iter().any(|a| a == marker)
}

/// Remove every occurrence of `marker`. The per-directory invocation does
/// not understand a fleet-wide flag.
pub fn strip_all_marker(args: &[String], marker: &str) -> Vec<String> {
    args.iter().filter(|a| *a != marker).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn strips_marker_wherever_it_appears() {
        let input = args(&["state", "rm", "--all", "aws_instance.x", "--all"]);
        assert_eq!(
            strip_all_marker(&input, DEFAULT_ALL_MARKER),
            args(&["state", "rm", "aws_instance.x"])
        );
    }

    #[test]
    fn similar_flags_are_kept() {
        let input = args(&["state", "rm", "--all-modules", "-all", "x"]);
        assert_eq!(strip_all_marker(&input, DEFAULT_ALL_MARKER), input);
        assert!(!has_all_marker(&input, DEFAULT_ALL_MARKER));
    }
}

//! Outcome stream decoding.
//!
//! The engine contract: one JSON object per finished unit on stdout,
//! `{"unit": "<node id>", "outcome": "passed" | "failed" | "error"}`.
//! Engines interleave human-readable chatter with the machine stream, so
//! anything that is not such an object is ignored rather than rejected.

use parabench_core::UnitOutcome;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct OutcomeLine {
    unit: String,
    outcome: UnitOutcome,
}

/// Decode one stdout line, if it is part of the machine stream.
pub fn parse_outcome_line(line: &str) -> Option<(String, UnitOutcome)> {
    let line = line.trim();
    if !line.starts_with('{') {
        return None;
    }
    serde_json::from_str::<OutcomeLine>(line)
        .ok()
        .map(|l| (l.unit, l.outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_machine_lines() {
        let (unit, outcome) =
            parse_outcome_line(r#"{"unit": "tests/test_vm.py::test_start", "outcome": "passed"}"#)
                .unwrap();
        assert_eq!(unit, "tests/test_vm.py::test_start");
        assert_eq!(outcome, UnitOutcome::Passed);
    }

    #[test]
    fn decodes_all_outcome_kinds() {
        for (text, expected) in [
            ("passed", UnitOutcome::Passed),
            ("failed", UnitOutcome::Failed),
            ("error", UnitOutcome::Error),
        ] {
            let line = format!(r#"{{"unit": "t::u", "outcome": "{}"}}"#, text);
            assert_eq!(parse_outcome_line(&line).unwrap().1, expected);
        }
    }

    #[test]
    fn ignores_human_chatter() {
        assert!(parse_outcome_line("").is_none());
        assert!(parse_outcome_line("collected 42 items").is_none());
        assert!(parse_outcome_line("===== 42 passed in 3.21s =====").is_none());
        // JSON, but not an outcome object
        assert!(parse_outcome_line(r#"{"summary": {"passed": 42}}"#).is_none());
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert!(parse_outcome_line("  {\"unit\": \"a::b\", \"outcome\": \"failed\"}  ").is_some());
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Recorded result of a single validation check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check, e.g. "causality" or "business_rules".
    pub check: String,
    pub passed: bool,
    /// Populated on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CheckResult {
    pub fn pass(check: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: true,
            reason: None,
        }
    }

    pub fn fail(check: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Aggregated outcome of running the full check pipeline over one event.
///
/// Every check is executed even when an earlier one fails, so the failure
/// list is always complete.
#[derive(Clone, Debug)]
pub struct ValidationOutcome {
    pub checks: Vec<CheckResult>,
    /// Wall-clock time for the full pipeline.
    pub duration: Duration,
}

impl ValidationOutcome {
    /// Returns `true` if every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Names of the checks that failed, in evaluation order.
    pub fn failed_checks(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.check.clone())
            .collect()
    }

    /// Human-readable reasons, one per failed check, prefixed with the
    /// check name ("check: reason").
    pub fn reasons(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| {
                let reason = check.reason.as_deref().unwrap_or("check failed");
                format!("{}: {}", check.check, reason)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_passed() {
        let outcome = ValidationOutcome {
            checks: vec![CheckResult::pass("causality"), CheckResult::pass("temporal")],
            duration: Duration::from_millis(2),
        };
        assert!(outcome.passed());
        assert!(outcome.failed_checks().is_empty());
        assert!(outcome.reasons().is_empty());
    }

    #[test]
    fn failures_are_complete_and_ordered() {
        let outcome = ValidationOutcome {
            checks: vec![
                CheckResult::fail("causality", "missing nodes: [nodeX]"),
                CheckResult::pass("actor_existence"),
                CheckResult::fail("temporal", "event timestamp is too old"),
            ],
            duration: Duration::from_millis(1),
        };
        assert!(!outcome.passed());
        assert_eq!(outcome.failed_checks(), vec!["causality", "temporal"]);
        assert_eq!(
            outcome.reasons(),
            vec![
                "causality: missing nodes: [nodeX]",
                "temporal: event timestamp is too old",
            ]
        );
    }

    #[test]
    fn check_result_serde() {
        let result = CheckResult::fail("business_rules", "amount must be positive");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["check"], "business_rules");
        assert_eq!(value["passed"], false);

        let passing = serde_json::to_value(CheckResult::pass("temporal")).unwrap();
        assert!(passing.get("reason").is_none());
    }
}

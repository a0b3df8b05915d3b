//! Outcome types for target execution

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What happened to a target during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    /// The action ran to completion
    Executed,
    /// The guard evaluated false, the action did not run
    Skipped,
}

impl TargetStatus {
    /// Returns true if the action ran
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed)
    }

    /// Returns true if the guard skipped the target
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executed => write!(f, "EXECUTED"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Result of one completed target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    /// Target identifier
    pub target: String,
    /// Executed or skipped
    pub status: TargetStatus,
    /// Wall-clock time spent on the target
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier of this invocation
    pub run_id: String,
    /// Target requested by the caller
    pub terminal: String,
    /// Completed targets in execution order
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    /// Identifiers of targets whose action ran
    pub fn executed(&self) -> Vec<&str> {
        self.filter(TargetStatus::Executed)
    }

    /// Identifiers of targets skipped by their guard
    pub fn skipped(&self) -> Vec<&str> {
        self.filter(TargetStatus::Skipped)
    }

    /// Sum of all target durations
    pub fn total_duration(&self) -> Duration {
        self.outcomes.iter().map(|o| o.duration).sum()
    }

    fn filter(&self, status: TargetStatus) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == status)
            .map(|o| o.target.as_str())
            .collect()
    }
}

/// One line of a dry-run plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Target identifier
    pub target: String,
    /// Declared dependencies
    pub depends_on: Vec<String>,
    /// Whether the guard currently allows the action to run
    pub will_run: bool,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            run_id: "run-1".to_string(),
            terminal: "Publish".to_string(),
            outcomes: vec![
                TargetOutcome {
                    target: "Clean".to_string(),
                    status: TargetStatus::Executed,
                    duration: Duration::from_millis(20),
                },
                TargetOutcome {
                    target: "Publish".to_string(),
                    status: TargetStatus::Skipped,
                    duration: Duration::from_millis(1),
                },
            ],
        }
    }

    #[test]
    fn test_status_helpers() {
        assert!(TargetStatus::Executed.is_executed());
        assert!(!TargetStatus::Executed.is_skipped());
        assert!(TargetStatus::Skipped.is_skipped());
        assert_eq!(TargetStatus::Skipped.to_string(), "SKIPPED");
    }

    #[test]
    fn test_report_partitions() {
        let report = report();
        assert_eq!(report.executed(), vec!["Clean"]);
        assert_eq!(report.skipped(), vec!["Publish"]);
        assert_eq!(report.total_duration(), Duration::from_millis(21));
    }

    #[test]
    fn test_report_serializes_durations_as_millis() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["outcomes"][0]["duration"], 20);
        assert_eq!(json["outcomes"][1]["status"], "skipped");

        let back: RunReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report());
    }
}

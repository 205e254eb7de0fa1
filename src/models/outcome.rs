//! Execution outcome data model.

use super::plan::OperationKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Result of one planned operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum OutcomeStatus {
    Success,
    Skipped { reason: String },
    Failed { reason: String },
    /// Failed after staging; the original was moved back.
    RolledBack { reason: String },
    /// Failed after staging and the original could not be moved back.
    Unrecoverable { reason: String, backup: PathBuf },
}

impl OutcomeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OutcomeStatus::Failed { .. }
                | OutcomeStatus::RolledBack { .. }
                | OutcomeStatus::Unrecoverable { .. }
        )
    }
}

/// Per-operation execution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Index of the operation in the plan.
    pub index: usize,
    pub kind: OperationKind,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub status: OutcomeStatus,
    /// Staged original, if one was created.
    pub backup: Option<PathBuf>,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

/// Aggregated result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Included operations in the plan.
    pub total: usize,
    /// Operations with a recorded outcome.
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    /// All failures, including rolled back and unrecoverable ones.
    pub failed: usize,
    pub restored: usize,
    pub unrecoverable: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub elapsed: Duration,
}

impl Summary {
    /// Fold one outcome into the summary.
    pub fn record(&mut self, outcome: &ExecutionOutcome) {
        self.processed += 1;
        match &outcome.status {
            OutcomeStatus::Success => {
                self.succeeded += 1;
                self.bytes_before += outcome.bytes_before;
                self.bytes_after += outcome.bytes_after;
            }
            OutcomeStatus::Skipped { .. } => self.skipped += 1,
            OutcomeStatus::Failed { .. } => self.failed += 1,
            OutcomeStatus::RolledBack { .. } => {
                self.failed += 1;
                self.restored += 1;
            }
            OutcomeStatus::Unrecoverable { .. } => {
                self.failed += 1;
                self.unrecoverable += 1;
            }
        }
    }

    /// Build a summary from a list of outcomes.
    pub fn from_outcomes(total: usize, outcomes: &[ExecutionOutcome], elapsed: Duration) -> Self {
        let mut summary = Summary {
            total,
            elapsed,
            ..Summary::default()
        };
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }

    /// Relative size change of successful items in percent.
    pub fn size_change_percent(&self) -> f64 {
        if self.bytes_before == 0 {
            return 0.0;
        }
        (self.bytes_after as f64 - self.bytes_before as f64) / self.bytes_before as f64 * 100.0
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalStatus {
    Completed,
    Cancelled,
    Failed,
}

impl std::fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalStatus::Completed => write!(f, "completed"),
            TerminalStatus::Cancelled => write!(f, "cancelled"),
            TerminalStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Payload of the single terminal event of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalEvent {
    pub status: TerminalStatus,
    pub summary: Summary,
    /// Staging directories left behind for the caller to purge.
    pub pending_staging_dirs: Vec<PathBuf>,
    /// Fatal error message for `Failed` runs.
    pub error: Option<String>,
    /// Every recorded outcome, in execution order.
    pub outcomes: Vec<ExecutionOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: OutcomeStatus) -> ExecutionOutcome {
        ExecutionOutcome {
            index: 0,
            kind: OperationKind::Transform,
            source: PathBuf::from("/r/a.png"),
            destination: PathBuf::from("/r/a.jpg"),
            status,
            backup: None,
            bytes_before: 100,
            bytes_after: 50,
        }
    }

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            outcome(OutcomeStatus::Success),
            outcome(OutcomeStatus::Skipped {
                reason: "unchanged".into(),
            }),
            outcome(OutcomeStatus::RolledBack {
                reason: "codec".into(),
            }),
            outcome(OutcomeStatus::Unrecoverable {
                reason: "codec".into(),
                backup: PathBuf::from("/r/.temp/a.png"),
            }),
        ];
        let summary = Summary::from_outcomes(5, &outcomes, Duration::from_secs(1));
        assert_eq!(summary.total, 5);
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.restored, 1);
        assert_eq!(summary.unrecoverable, 1);
        assert_eq!(summary.bytes_before, 100);
        assert_eq!(summary.bytes_after, 50);
        assert_eq!(summary.size_change_percent(), -50.0);
    }
}

//! Reports returned by the reconciliation service.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pharmacy_entity::notification::NotificationCount;

use crate::alerting::AlertOutcome;

/// Outcome of one reconciliation phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: String,
    pub outcome: AlertOutcome,
}

/// Outcome of a full run, phases in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
}

impl ReconciliationReport {
    pub fn total(&self) -> AlertOutcome {
        self.phases
            .iter()
            .fold(AlertOutcome::default(), |acc, p| acc + p.outcome)
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == name)
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Notification counts grouped by type and priority.
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub since: DateTime<Utc>,
    pub counts: Vec<NotificationCount>,
}

impl AlertSummary {
    pub fn total(&self) -> i64 {
        self.counts.iter().map(|c| c.count).sum()
    }
}

/// How many catalog entries currently meet each alert condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertState {
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub expiring: usize,
    pub expired: usize,
}

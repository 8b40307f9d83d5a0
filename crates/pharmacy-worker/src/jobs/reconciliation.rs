//! Reconciliation checks, the daily full run and notification cleanup.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use pharmacy_service::ReconciliationService;

use crate::executor::{JobExecutionError, JobHandler};

/// Job type handled by [`ReconciliationJobHandler`].
pub const JOB_TYPE: &str = "reconciliation";

/// Work a reconciliation firing can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationTask {
    /// Every batch check, no cleanup.
    Checks,
    /// Every batch check followed by cleanup.
    Daily,
    Cleanup,
}

impl ReconciliationTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checks => "checks",
            Self::Daily => "daily",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for ReconciliationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconciliationTask {
    type Err = JobExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checks" => Ok(Self::Checks),
            "daily" => Ok(Self::Daily),
            "cleanup" => Ok(Self::Cleanup),
            other => Err(JobExecutionError::Permanent(format!(
                "Unknown reconciliation task: '{other}'"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct ReconciliationJobHandler {
    service: Arc<ReconciliationService>,
}

impl ReconciliationJobHandler {
    pub fn new(service: Arc<ReconciliationService>) -> Self {
        Self { service }
    }

    async fn run_checks(&self) -> Result<Value, JobExecutionError> {
        let report = self.service.run_all_checks().await;
        let total = report.total();
        if total.has_failures() {
            tracing::warn!(
                failed = total.failed,
                "Reconciliation finished with failed alert checks"
            );
        }
        serde_json::to_value(&report).map_err(|e| JobExecutionError::Internal(e.into()))
    }

    async fn run_cleanup(&self) -> Result<Value, JobExecutionError> {
        let retention_days = self.service.settings().retention_days;
        let deleted = self.service.cleanup(retention_days).await.map_err(|e| {
            JobExecutionError::Transient(format!("Notification cleanup failed: {e}"))
        })?;

        Ok(serde_json::json!({
            "task": "cleanup",
            "deleted": deleted,
            "retention_days": retention_days,
        }))
    }
}

#[async_trait]
impl JobHandler for ReconciliationJobHandler {
    fn job_type(&self) -> &str {
        JOB_TYPE
    }

    async fn execute(&self, task: &str) -> Result<Value, JobExecutionError> {
        match task.parse::<ReconciliationTask>()? {
            ReconciliationTask::Checks => self.run_checks().await,
            ReconciliationTask::Cleanup => self.run_cleanup().await,
            ReconciliationTask::Daily => {
                let checks = self.run_checks().await?;
                let cleanup = self.run_cleanup().await?;
                Ok(serde_json::json!({
                    "task": "daily",
                    "checks": checks,
                    "cleanup": cleanup,
                }))
            }
        }
    }
}

//! Job executor: dispatches scheduled tasks to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use pharmacy_core::error::AppError;

/// A handler owning one job type. `task` selects the work inside it.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    fn job_type(&self) -> &str;

    /// Run `task` and return a JSON summary of what was done.
    async fn execute(&self, task: &str) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// The request itself is wrong; running it again will not help.
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Storage or other transient failure; the next firing may succeed.
    #[error("Transient job failure: {0}")]
    Transient(String),

    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Registered handlers by job type
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!(job_type = %job_type, "Registered job handler");
        self.handlers.insert(job_type, handler);
    }

    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    pub async fn execute(&self, job_type: &str, task: &str) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{job_type}'"
            ))
        })?;

        tracing::debug!(job_type, task, "Executing job");
        handler.execute(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoHandler;

    #[async_trait]
    impl JobHandler for EchoHandler {
        fn job_type(&self) -> &str {
            "echo"
        }

        async fn execute(&self, task: &str) -> Result<Value, JobExecutionError> {
            Ok(serde_json::json!({ "task": task }))
        }
    }

    #[tokio::test]
    async fn test_dispatches_by_job_type() {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(EchoHandler));
        assert!(executor.has_handler("echo"));

        let value = executor.execute("echo", "ping").await.unwrap();
        assert_eq!(value["task"], "ping");
    }

    #[tokio::test]
    async fn test_unknown_job_type_is_permanent() {
        let executor = JobExecutor::new();
        let err = executor.execute("missing", "ping").await.unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
    }
}

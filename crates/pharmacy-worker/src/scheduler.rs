//! Cron scheduler for the periodic reconciliation tasks.

use std::sync::Arc;
use std::time::Instant;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use pharmacy_core::config::SchedulerConfig;
use pharmacy_core::error::AppError;

use crate::executor::JobExecutor;
use crate::jobs::ReconciliationTask;
use crate::jobs::reconciliation::JOB_TYPE;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor>,
    config: SchedulerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("config", &self.config)
            .finish()
    }
}

impl CronScheduler {
    pub async fn new(executor: Arc<JobExecutor>, config: SchedulerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            executor,
            config,
        })
    }

    /// Register the four reconciliation schedules from configuration.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register(
            "business_hours_checks",
            &self.config.business_hours_cron,
            ReconciliationTask::Checks,
        )
        .await?;
        self.register(
            "off_hours_checks",
            &self.config.off_hours_cron,
            ReconciliationTask::Checks,
        )
        .await?;
        self.register("daily_run", &self.config.daily_cron, ReconciliationTask::Daily)
            .await?;
        self.register(
            "notification_cleanup",
            &self.config.cleanup_cron,
            ReconciliationTask::Cleanup,
        )
        .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Fire `task` on `cron`. A failing run is logged; the schedule stays.
    async fn register(
        &self,
        name: &'static str,
        cron: &str,
        task: ReconciliationTask,
    ) -> Result<(), AppError> {
        let executor = Arc::clone(&self.executor);
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            Box::pin(async move {
                tracing::debug!(schedule = name, task = %task, "Running scheduled task");
                let started = Instant::now();
                match executor.execute(JOB_TYPE, task.as_str()).await {
                    Ok(summary) => tracing::info!(
                        schedule = name,
                        task = %task,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        summary = %summary,
                        "Scheduled task finished"
                    ),
                    Err(e) => tracing::error!(
                        schedule = name,
                        task = %task,
                        error = %e,
                        "Scheduled task failed"
                    ),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid cron expression for {name} ('{cron}'): {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::scheduler(format!("Failed to add {name} schedule: {e}")))?;

        tracing::info!(schedule = name, cron, task = %task, "Registered scheduled task");
        Ok(())
    }
}

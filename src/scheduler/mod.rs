pub mod tasks;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ScheduleTime;

use self::tasks::DailyReport;

/// Cron scheduler that fires the daily report in the machine's local time.
pub struct ReportScheduler {
    inner: JobScheduler,
}

impl ReportScheduler {
    /// Schedule `report` once a day at `at` and start the scheduler.
    ///
    /// Returns only after the scheduler is running, so any failure surfaces
    /// here at startup.
    pub async fn start(at: ScheduleTime, report: DailyReport) -> Result<Self> {
        let scheduler = Self::start_with_cron(&at.cron_expression(), report).await?;
        info!("Daily report scheduled at {}", at);
        Ok(scheduler)
    }

    async fn start_with_cron(cron_expr: &str, report: DailyReport) -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;

        let report = Arc::new(report);
        let job = Job::new_async_tz(cron_expr, Local, move |_uuid, _lock| {
            let report = report.clone();
            Box::pin(async move {
                info!("Running daily report");
                report.run().await;
            })
        })
        .with_context(|| format!("Invalid daily report schedule: {}", cron_expr))?;

        inner
            .add(job)
            .await
            .context("Failed to add daily report job")?;
        inner
            .start()
            .await
            .context("Failed to start scheduler")?;

        info!("Scheduler started with cron: {}", cron_expr);
        Ok(Self { inner })
    }

    /// Wait for `shutdown`, then stop the scheduler.
    pub async fn run_until_cancelled(mut self, shutdown: CancellationToken) -> Result<()> {
        shutdown.cancelled().await;
        info!("Stopping scheduler...");
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::bot::responder::Responder;
use crate::report::ReportSource;

/// Build a report for `display_name` and send it to the chat.
pub async fn send_report(
    reports: &dyn ReportSource,
    responder: &Responder,
    display_name: &str,
) -> Result<()> {
    let report = reports
        .build_report(display_name)
        .await
        .context("Failed to build report")?;
    responder.send_text(&report).await?;
    Ok(())
}

/// The scheduled daily report for this host.
pub struct DailyReport {
    reports: Arc<dyn ReportSource>,
    responder: Responder,
    display_name: String,
}

impl DailyReport {
    pub fn new(reports: Arc<dyn ReportSource>, responder: Responder, display_name: String) -> Self {
        Self {
            reports,
            responder,
            display_name,
        }
    }

    /// Send one report. Failures are logged and the schedule keeps running.
    pub async fn run(&self) {
        match send_report(self.reports.as_ref(), &self.responder, &self.display_name).await {
            Ok(()) => info!("Daily report sent"),
            Err(e) => error!("Failed to send daily report: {:#}", e),
        }
    }
}

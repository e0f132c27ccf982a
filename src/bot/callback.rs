use anyhow::Result;
use tracing::{debug, error, info};

use crate::bot::BotContext;
use crate::telegram::CallbackQuery;

/// Handle a host-menu button press.
///
/// The query is always answered first. Only this host's own id produces a
/// report; other ids belong to hosts this process has no data for.
pub async fn handle_callback(ctx: &BotContext, query: &CallbackQuery) -> Result<()> {
    let host_id = query.data.as_str();
    info!(
        "Report requested for host {} by {}",
        host_id, query.sender.first_name
    );

    ctx.responder.answer_callback(&query.id).await;

    if host_id != ctx.own_id {
        debug!("Ignoring callback for foreign host {}", host_id);
        return Ok(());
    }

    match ctx.reports.build_report(&ctx.own_name).await {
        Ok(report) => {
            let sent = ctx.responder.send_text(&report).await;
            ctx.registry.touch(&ctx.own_id).await;
            sent
        }
        Err(e) => {
            error!("Failed to build report: {:#}", e);
            let detail = format!("{:#}", e);
            ctx.responder
                .send_text(&format!(
                    "{}: {}",
                    ctx.texts.report_error,
                    html_escape::encode_text(&detail)
                ))
                .await
        }
    }
}

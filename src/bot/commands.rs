use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::bot::keyboard::build_keyboard;
use crate::bot::registry::{HostRecord, HostStatus};
use crate::bot::BotContext;
use crate::i18n::Texts;
use crate::telegram::Message;

/// Recognised chat commands. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Info,
    Status,
    Help,
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        match text {
            "/info" => Command::Info,
            "/status" => Command::Status,
            "/help" | "/start" => Command::Help,
            _ => Command::Unknown,
        }
    }
}

pub async fn handle_command(ctx: &BotContext, msg: &Message) -> Result<()> {
    let from = msg
        .sender
        .as_ref()
        .map(|u| u.username.clone().unwrap_or_else(|| u.first_name.clone()))
        .unwrap_or_default();
    info!("Command {} from {} (chat {})", msg.text, from, msg.chat.id);

    match Command::parse(&msg.text) {
        Command::Info => handle_info(ctx).await,
        Command::Status => handle_status(ctx).await,
        Command::Help => ctx.responder.send_text(ctx.texts.help).await,
        Command::Unknown => ctx.responder.send_text(ctx.texts.unknown_command).await,
    }
}

async fn handle_info(ctx: &BotContext) -> Result<()> {
    let hosts = ctx.registry.snapshot().await;
    if hosts.is_empty() {
        return ctx.responder.send_text(ctx.texts.no_hosts_available).await;
    }

    let markup = build_keyboard(&hosts);
    ctx.responder
        .send_keyboard(ctx.texts.select_host, &markup)
        .await;
    Ok(())
}

async fn handle_status(ctx: &BotContext) -> Result<()> {
    let hosts = ctx.registry.snapshot().await;
    let text = format_status(&hosts, Utc::now(), ctx.texts);
    ctx.responder.send_text(&text).await
}

/// Elapsed time rounded to the nearest minute, half a minute rounding up.
fn elapsed_minutes(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - last_seen).num_milliseconds().max(0);
    (millis + 30_000) / 60_000
}

pub fn format_status(hosts: &[HostRecord], now: DateTime<Utc>, texts: &Texts) -> String {
    if hosts.is_empty() {
        return texts.no_hosts_registered.to_string();
    }

    let mut status = format!("{}\n\n", texts.status_header);
    for host in hosts {
        let (icon, label) = match host.status(now) {
            HostStatus::Online => ("✅", texts.online),
            HostStatus::Offline => ("❌", texts.offline),
        };
        status.push_str(&format!(
            "{} <b>{}</b> - {}\n",
            icon,
            html_escape::encode_text(&host.display_name),
            label
        ));
        status.push_str(&format!(
            "   {}: {}\n\n",
            texts.last_activity,
            texts.minutes_ago(elapsed_minutes(host.last_seen, now))
        ));
    }
    status.trim_end().to_string()
}

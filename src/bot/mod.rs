pub mod callback;
pub mod commands;
pub mod dispatcher;
pub mod keyboard;
pub mod poller;
pub mod registry;
pub mod responder;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::i18n::Texts;
use crate::report::ReportSource;
use crate::telegram::Transport;

use self::dispatcher::Dispatcher;
use self::poller::{Poller, RetryPolicy, TokioSleeper};
use self::registry::ComputerRegistry;
use self::responder::Responder;

/// State shared by the command and callback handlers.
pub struct BotContext {
    pub registry: Arc<ComputerRegistry>,
    pub responder: Responder,
    pub reports: Arc<dyn ReportSource>,
    /// Id and display name of the host this process runs on.
    pub own_id: String,
    pub own_name: String,
    pub texts: &'static Texts,
}

impl BotContext {
    pub fn new(
        config: &Config,
        registry: Arc<ComputerRegistry>,
        responder: Responder,
        reports: Arc<dyn ReportSource>,
    ) -> Self {
        Self {
            registry,
            responder,
            reports,
            own_id: config.computer_id.clone(),
            own_name: config.computer_name.clone(),
            texts: Texts::for_language(config.language),
        }
    }
}

/// Register this host and long-poll for updates until `shutdown` fires.
pub async fn run(
    ctx: Arc<BotContext>,
    transport: Arc<dyn Transport>,
    shutdown: CancellationToken,
) -> Result<()> {
    ctx.registry.register(&ctx.own_id, &ctx.own_name).await;
    info!(
        "Registered {} ({}); {} host(s) known",
        ctx.own_name,
        ctx.own_id,
        ctx.registry.snapshot().await.len()
    );

    let dispatcher = Arc::new(Dispatcher::new(ctx));
    let mut poller = Poller::new(
        transport,
        dispatcher,
        RetryPolicy::default(),
        Arc::new(TokioSleeper),
    );
    poller.run(shutdown).await
}

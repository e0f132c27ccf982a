use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bot::dispatcher::UpdateHandler;
use crate::telegram::Transport;

/// Long-poll window passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u32 = 30;

/// How the poller waits after a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    /// Multiplier applied per consecutive failure; 1 keeps the delay fixed.
    pub backoff_factor: u32,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            backoff_factor: 1,
            max_delay: delay,
            max_attempts: None,
        }
    }

    /// Delay before the next attempt after `failures` consecutive failures (1-based).
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let factor = self.backoff_factor.max(1).saturating_pow(exponent);
        self.delay.saturating_mul(factor).min(self.max_delay.max(self.delay))
    }

    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts.is_some_and(|max| failures >= max)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sequential long-polling loop. One fetch is in flight at a time and each
/// batch is dispatched in order before the next fetch.
pub struct Poller {
    transport: Arc<dyn Transport>,
    handler: Arc<dyn UpdateHandler>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    offset: i64,
}

impl Poller {
    pub fn new(
        transport: Arc<dyn Transport>,
        handler: Arc<dyn UpdateHandler>,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            transport,
            handler,
            retry,
            sleeper,
            offset: 0,
        }
    }

    /// Next update id to request; one past the last dispatched update.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Poll until `shutdown` is cancelled or the retry policy gives up.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!("Starting Telegram polling...");
        let mut failures: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let fetched = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.transport.fetch_updates(self.offset, POLL_TIMEOUT_SECS) => result,
            };

            match fetched {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        let id = update.id;
                        self.handler.handle(update).await;
                        self.offset = self.offset.max(id + 1);
                    }
                }
                Err(e) => {
                    failures += 1;
                    if self.retry.exhausted(failures) {
                        bail!("Giving up on getUpdates after {} attempts: {}", failures, e);
                    }
                    let delay = self.retry.delay_for(failures);
                    warn!(
                        "Failed to fetch updates (attempt {}): {}; retrying in {:?}",
                        failures, e, delay
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = self.sleeper.sleep(delay) => {}
                    }
                }
            }
        }

        info!("Polling stopped at offset {}", self.offset());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::testing::{api_error, text_update, RecordingTransport};
    use crate::telegram::Update;
    use std::sync::Mutex;

    /// Records dispatched ids and cancels the poller after `stop_after` updates.
    struct CountingHandler {
        seen: Mutex<Vec<i64>>,
        stop_after: usize,
        shutdown: CancellationToken,
    }

    impl CountingHandler {
        fn new(stop_after: usize, shutdown: CancellationToken) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                stop_after,
                shutdown,
            }
        }

        fn seen(&self) -> Vec<i64> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UpdateHandler for CountingHandler {
        async fn handle(&self, update: Update) {
            let count = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(update.id);
                seen.len()
            };
            if count >= self.stop_after {
                self.shutdown.cancel();
            }
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn batch(ids: &[i64]) -> Vec<Update> {
        ids.iter().map(|&id| text_update(id, "/status")).collect()
    }

    #[tokio::test]
    async fn test_cursor_advances_per_update() {
        let shutdown = CancellationToken::new();
        let transport = Arc::new(RecordingTransport::new());
        transport.push_fetch(Ok(batch(&[3, 4, 5])));
        transport.push_fetch(Ok(Vec::new()));
        transport.push_fetch(Ok(batch(&[6])));
        let handler = Arc::new(CountingHandler::new(4, shutdown.clone()));
        let sleeper = Arc::new(RecordingSleeper::default());

        let mut poller = Poller::new(
            transport.clone(),
            handler.clone(),
            RetryPolicy::default(),
            sleeper.clone(),
        );
        poller.run(shutdown).await.unwrap();

        assert_eq!(handler.seen(), vec![3, 4, 5, 6]);
        assert_eq!(transport.fetch_offsets(), vec![0, 6, 6]);
        assert_eq!(poller.offset(), 7);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cursor_never_decreases() {
        let shutdown = CancellationToken::new();
        let transport = Arc::new(RecordingTransport::new());
        transport.push_fetch(Ok(batch(&[10])));
        // A stale redelivery must not move the cursor back.
        transport.push_fetch(Ok(batch(&[8])));
        let handler = Arc::new(CountingHandler::new(2, shutdown.clone()));

        let mut poller = Poller::new(
            transport.clone(),
            handler,
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default()),
        );
        poller.run(shutdown).await.unwrap();

        assert_eq!(transport.fetch_offsets(), vec![0, 11]);
        assert_eq!(poller.offset(), 11);
    }

    #[tokio::test]
    async fn test_three_failures_then_success_keeps_cursor() {
        let shutdown = CancellationToken::new();
        let transport = Arc::new(RecordingTransport::new());
        transport.push_fetch(Ok(batch(&[1])));
        for _ in 0..3 {
            transport.push_fetch(Err(api_error("getUpdates")));
        }
        transport.push_fetch(Ok(batch(&[2])));
        let handler = Arc::new(CountingHandler::new(2, shutdown.clone()));
        let sleeper = Arc::new(RecordingSleeper::default());

        let mut poller = Poller::new(
            transport.clone(),
            handler.clone(),
            RetryPolicy::default(),
            sleeper.clone(),
        );
        poller.run(shutdown).await.unwrap();

        assert_eq!(transport.fetch_offsets(), vec![0, 2, 2, 2, 2]);
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![Duration::from_secs(5); 3]
        );
        assert_eq!(handler.seen(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_max_attempts_stops_loop() {
        let transport = Arc::new(RecordingTransport::new());
        for _ in 0..5 {
            transport.push_fetch(Err(api_error("getUpdates")));
        }
        let retry = RetryPolicy {
            max_attempts: Some(3),
            ..RetryPolicy::default()
        };
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut poller = Poller::new(
            transport.clone(),
            Arc::new(CountingHandler::new(usize::MAX, CancellationToken::new())),
            retry,
            sleeper.clone(),
        );

        let err = poller.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("3 attempts"));
        assert_eq!(transport.fetch_offsets().len(), 3);
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_does_not_fetch() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let transport = Arc::new(RecordingTransport::new());
        let mut poller = Poller::new(
            transport.clone(),
            Arc::new(CountingHandler::new(1, shutdown.clone())),
            RetryPolicy::default(),
            Arc::new(TokioSleeper),
        );

        poller.run(shutdown).await.unwrap();
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_retry_sleep() {
        let shutdown = CancellationToken::new();
        let transport = Arc::new(RecordingTransport::new());
        transport.push_fetch(Err(api_error("getUpdates")));
        let retry = RetryPolicy::fixed(Duration::from_secs(3600));
        let mut poller = Poller::new(
            transport,
            Arc::new(CountingHandler::new(1, shutdown.clone())),
            retry,
            Arc::new(TokioSleeper),
        );

        let token = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), poller.run(shutdown))
            .await
            .expect("poller should stop on cancellation")
            .unwrap();
    }

    #[test]
    fn test_retry_policy_delays() {
        let fixed = RetryPolicy::default();
        assert_eq!(fixed.delay_for(1), Duration::from_secs(5));
        assert_eq!(fixed.delay_for(10), Duration::from_secs(5));
        assert!(!fixed.exhausted(u32::MAX));

        let backoff = RetryPolicy {
            delay: Duration::from_secs(1),
            backoff_factor: 2,
            max_delay: Duration::from_secs(10),
            max_attempts: Some(5),
        };
        assert_eq!(backoff.delay_for(1), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(8), Duration::from_secs(10));
        assert!(!backoff.exhausted(4));
        assert!(backoff.exhausted(5));
    }
}

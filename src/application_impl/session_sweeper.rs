use crate::domain_port::Clock;
use crate::infra_memory::RefreshTokenStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Periodically drops expired refresh sessions, off the request path.
pub struct SessionSweeper {
    store: Arc<RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl SessionSweeper {
    pub fn new(
        store: Arc<RefreshTokenStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            clock,
            interval,
            cancellation_token,
        }
    }

    pub fn sweep_once(&self) -> usize {
        let purged = self.store.sweep_expired(self.clock.now());
        if purged > 0 {
            tracing::debug!(purged, remaining = self.store.len(), "expired sessions swept");
        }
        purged
    }

    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("SessionSweeper shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::*;
    use crate::domain_port::ManualClock;
    use chrono::Utc;

    fn seed(store: &RefreshTokenStore, token: &str, expires_in: chrono::Duration) {
        let now = Utc::now();
        store.put(SessionRecord::new(
            RefreshToken(token.to_string()).digest(),
            UserId::new_v4(),
            now,
            now + expires_in,
        ));
    }

    #[test]
    fn sweep_once_uses_the_injected_clock() {
        let store = Arc::new(RefreshTokenStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        seed(&store, "short", chrono::Duration::minutes(1));
        seed(&store, "long", chrono::Duration::days(7));

        let sweeper = SessionSweeper::new(
            store.clone(),
            clock.clone(),
            DEFAULT_SWEEP_INTERVAL,
            CancellationToken::new(),
        );
        assert_eq!(sweeper.sweep_once(), 0);

        clock.advance(chrono::Duration::hours(1));
        assert_eq!(sweeper.sweep_once(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_sweeps_on_each_tick_until_cancelled() {
        let store = Arc::new(RefreshTokenStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        seed(&store, "soon", chrono::Duration::seconds(1));
        clock.advance(chrono::Duration::seconds(2));

        let cancel = CancellationToken::new();
        let sweeper = SessionSweeper::new(
            store.clone(),
            clock,
            Duration::from_secs(10),
            cancel.clone(),
        );
        let handle = tokio::spawn(async move { sweeper.run().await });

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(store.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}

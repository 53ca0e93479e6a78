//! Scheduler - TickDriver を一定間隔で回すループ
//!
//! # 学習ポイント
//! - `watch` チャネルによる shutdown 通知
//! - 発火ごとに tick を spawn する（前の tick が終わっていなければ TickDriver 側で Overlapped）
//! - 次の発火時刻は interval の境界に揃える（既定では毎時 0 分）
//!
//! shutdown は新しい発火を止めるだけで、実行中の tick は最後まで走らせる。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::tick::TickDriver;
use crate::domain::TickOutcome;
use crate::ports::Clock;

pub struct Scheduler {
    driver: Arc<TickDriver>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    align: bool,
}

impl Scheduler {
    pub fn new(
        driver: Arc<TickDriver>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
        align: bool,
    ) -> Self {
        Self {
            driver,
            clock,
            tick_interval,
            align,
        }
    }

    pub fn driver(&self) -> &Arc<TickDriver> {
        &self.driver
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run a single tick right now.
    pub async fn tick_once(&self) -> TickOutcome {
        self.driver.tick().await
    }

    /// Start the loop in the background.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            self.run_loop(shutdown_rx).await;
        });
        SchedulerHandle { shutdown_tx, join }
    }

    async fn run_loop(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.tick_interval.as_secs(),
            align = self.align,
            "scheduler started"
        );
        let mut inflight = JoinSet::new();

        loop {
            if *shutdown.borrow() {
                break;
            }
            let delay = next_fire_delay(self.clock.now(), self.tick_interval, self.align);
            debug!(?delay, "waiting for next tick");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                // sender dropped counts as shutdown too
                _ = shutdown.changed() => break,
            }

            let driver = Arc::clone(&self.driver);
            inflight.spawn(async move { driver.tick().await });

            while let Some(done) = inflight.try_join_next() {
                if let Err(err) = done {
                    warn!(error = %err, "tick task ended abnormally");
                }
            }
        }

        while let Some(done) = inflight.join_next().await {
            if let Err(err) = done {
                warn!(error = %err, "tick task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling new ticks. A tick already running is left to finish.
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the loop and any in-flight tick.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

/// Delay until the next fire.
///
/// With `align`, fires land on multiples of `interval` since the Unix epoch
/// (an hourly interval fires at the top of each hour). Exactly on a boundary
/// the next fire is one full interval away.
pub fn next_fire_delay(now: DateTime<Utc>, interval: Duration, align: bool) -> Duration {
    let interval_ms = interval.as_millis();
    if !align || interval_ms == 0 {
        return interval;
    }
    let now_ms = now.timestamp_millis().max(0) as u128;
    let into_period = now_ms % interval_ms;
    let remaining = interval_ms - into_period;
    Duration::from_millis(remaining as u64)
}

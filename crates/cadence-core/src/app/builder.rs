//! SchedulerBuilder - scheduler の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 必須の port が欠けていれば build() で止める
//! - 設定値（timeout, retry, credential key）をここで各コンポーネントに配る

use std::sync::Arc;

use super::execution::Executor;
use super::publish_guard::GuardedPublisher;
use super::scheduler::Scheduler;
use super::selection::SelectionEngine;
use super::tick::TickDriver;
use crate::config::{ConfigError, SchedulerConfig};
use crate::ports::{Clock, CredentialStore, Publisher, RandomSource, Store, SystemClock, ThreadRandom};

/// SchedulerBuilder は Scheduler を構築
///
/// # 使用例
/// ```ignore
/// let scheduler = SchedulerBuilder::new(config)
///     .store(store)
///     .publisher(publisher)
///     .credentials(credentials)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store / publisher / credentials は必須
/// - clock / random は省略時に SystemClock / ThreadRandom
/// - build() 時に config も検証する
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    store: Option<Arc<dyn Store>>,
    publisher: Option<Arc<dyn Publisher>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing components: {0:?}. These must be provided before build().")]
    Missing(Vec<&'static str>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SchedulerBuilder {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            store: None,
            publisher: None,
            credentials: None,
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// The raw publisher. It is wrapped with the configured timeout and retry.
    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn build(self) -> Result<Scheduler, BuildError> {
        self.config.validate()?;

        let mut missing = Vec::new();
        if self.store.is_none() {
            missing.push("store");
        }
        if self.publisher.is_none() {
            missing.push("publisher");
        }
        if self.credentials.is_none() {
            missing.push("credentials");
        }
        let (Some(store), Some(publisher), Some(credentials)) =
            (self.store, self.publisher, self.credentials)
        else {
            return Err(BuildError::Missing(missing));
        };

        let publisher: Arc<dyn Publisher> = Arc::new(GuardedPublisher::new(
            publisher,
            self.config.publish_timeout(),
            self.config.retry_policy(),
        ));
        let engine = SelectionEngine::new(Arc::clone(&store), self.random);
        let executor = Executor::new(publisher, Arc::clone(&store), Arc::clone(&self.clock));
        let driver = TickDriver::new(
            store,
            credentials,
            self.config.credential_keys.clone(),
            engine,
            executor,
            Arc::clone(&self.clock),
        );

        Ok(Scheduler::new(
            Arc::new(driver),
            self.clock,
            self.config.tick_interval(),
            self.config.align_to_interval,
        ))
    }
}

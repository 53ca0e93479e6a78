//! TickDriver - 1 回の tick を全 tenant に対して実行する
//!
//! # 状態遷移
//! - Idle -> Running -> Idle
//! - Running 中に来た tick は実行せずに `TickOutcome::Overlapped` を返す（同時実行しない）
//!
//! # フロー（tenant ごと、順番に）
//! 1. SelectionEngine::select_candidates
//! 2. 候補があれば credential を解決（不足なら ConfigurationError でその tenant だけ skip）
//! 3. Executor::execute を候補の順に 1 件ずつ（失敗しても残りは続ける）

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::execution::Executor;
use super::selection::SelectionEngine;
use crate::domain::{TenantId, TenantReport, TenantTickError, TickOutcome, TickReport};
use crate::ports::{Clock, CredentialKeys, CredentialStore, Store};

/// Idle / Running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

pub struct TickDriver {
    store: Arc<dyn Store>,
    credentials: Arc<dyn CredentialStore>,
    credential_keys: CredentialKeys,
    engine: SelectionEngine,
    executor: Executor,
    clock: Arc<dyn Clock>,
    running: Mutex<()>,
}

impl TickDriver {
    pub fn new(
        store: Arc<dyn Store>,
        credentials: Arc<dyn CredentialStore>,
        credential_keys: CredentialKeys,
        engine: SelectionEngine,
        executor: Executor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            credentials,
            credential_keys,
            engine,
            executor,
            clock,
            running: Mutex::new(()),
        }
    }

    pub fn state(&self) -> DriverState {
        match self.running.try_lock() {
            Ok(_) => DriverState::Idle,
            Err(_) => DriverState::Running,
        }
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    /// Run one tick across every tenant, unless a tick is already running.
    pub async fn tick(&self) -> TickOutcome {
        let Ok(_running) = self.running.try_lock() else {
            warn!("previous tick still running; skipping this one");
            return TickOutcome::Overlapped;
        };

        let now = self.clock.now();
        let mut report = TickReport::new(now);

        let tenants = match self.store.list_tenants().await {
            Ok(tenants) => tenants,
            Err(err) => {
                error!(error = %err, "could not list tenants");
                return TickOutcome::Completed(report);
            }
        };

        for tenant_id in tenants {
            report.tenants.push(self.run_tenant(tenant_id).await);
        }

        let counts = report.counts();
        info!(
            tenants = counts.tenants,
            skipped = counts.tenants_skipped,
            selected = counts.selected,
            published = counts.published,
            failed = counts.failed,
            "tick finished"
        );
        TickOutcome::Completed(report)
    }

    /// One tenant's share of a tick. Never fails; problems land in the report.
    pub async fn run_tenant(&self, tenant_id: TenantId) -> TenantReport {
        let now = self.clock.now();
        let tasks = match self.engine.select_candidates(tenant_id, now).await {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(tenant = %tenant_id, error = %err, "selection failed; skipping tenant");
                return TenantReport::skipped(tenant_id, TenantTickError::Selection(err));
            }
        };
        if tasks.is_empty() {
            debug!(tenant = %tenant_id, "nothing to publish");
            return TenantReport::new(tenant_id);
        }

        let secrets = match self.credentials.get(tenant_id).await {
            Ok(secrets) => secrets,
            Err(err) => {
                error!(tenant = %tenant_id, error = %err, "credential lookup failed; skipping tenant");
                return TenantReport::skipped(tenant_id, TenantTickError::Credentials(err));
            }
        };
        let credentials = match self.credential_keys.resolve(tenant_id, &secrets) {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(tenant = %tenant_id, missing = ?err.missing, "tenant not configured; skipping");
                return TenantReport::skipped(tenant_id, err.into());
            }
        };

        let mut report = TenantReport::new(tenant_id);
        report.selected = tasks.len();
        for task in &tasks {
            match self.executor.execute(task, &credentials).await {
                Ok(published) => report.published.push(published),
                Err(err) => report.failed.push(err),
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Channel, ChannelId, ExecutionError, ImageRef, Playlist, PlaylistId, Post, PostId,
        PostStatus, PublishError, StoreError, Tenant,
    };
    use crate::impls::{InMemoryCredentialStore, InMemoryStore, ScriptedPublisher};
    use crate::ports::{FixedClock, PostFilter, Publisher, SeededRandom, TenantSecrets};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::time::Duration as StdDuration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn t(n: u128) -> TenantId {
        TenantId::from_u128(n)
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        credentials: Arc<InMemoryCredentialStore>,
        publisher: Arc<ScriptedPublisher>,
        driver: Arc<TickDriver>,
    }

    async fn harness(publisher: ScriptedPublisher) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let credentials = Arc::new(InMemoryCredentialStore::new());
        let publisher = Arc::new(publisher);
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));

        let engine = SelectionEngine::new(store.clone(), Arc::new(SeededRandom::new(5)));
        let executor = Executor::new(
            publisher.clone() as Arc<dyn Publisher>,
            store.clone(),
            clock.clone(),
        );
        let driver = Arc::new(TickDriver::new(
            store.clone(),
            credentials.clone(),
            CredentialKeys::default(),
            engine,
            executor,
            clock,
        ));
        Harness {
            store,
            credentials,
            publisher,
            driver,
        }
    }

    async fn add_tenant(h: &Harness, n: u128) {
        h.store.insert_tenant(Tenant::new(t(n), format!("tenant {n}"))).await;
        h.credentials
            .put(
                t(n),
                TenantSecrets::new()
                    .with("linkedin_access_token", format!("tok-{n}"))
                    .with("linkedin_urn", format!("urn:li:organization:{n}")),
            )
            .await;
    }

    #[tokio::test]
    async fn overdue_precision_post_is_published_and_detached() {
        let h = harness(ScriptedPublisher::new()).await;
        add_tenant(&h, 1).await;
        let playlist = PlaylistId::from_u128(4);
        h.store.insert_playlist(Playlist::new(playlist, t(1), "p")).await;
        h.store
            .insert_post(
                Post::new(PostId::from_u128(1), t(1), "A", now() - Duration::days(1))
                    .in_playlist(playlist)
                    .scheduled_at(now() - Duration::hours(1)),
            )
            .await;

        let outcome = h.driver.tick().await;
        let report = outcome.report().unwrap();
        assert_eq!(report.counts().published, 1);

        let a = h.store.get_post(t(1), PostId::from_u128(1)).await.unwrap().unwrap();
        assert_eq!(a.status, PostStatus::Posted);
        assert!(a.scheduled_at.is_none());
        assert!(a.playlist_id.is_none());
        assert_eq!(h.driver.state(), DriverState::Idle);
    }

    #[tokio::test]
    async fn failed_publish_does_not_abort_batch_and_is_retried_next_tick() {
        let h = harness(ScriptedPublisher::new()).await;
        add_tenant(&h, 1).await;
        for (id, content) in [(1, "first"), (2, "second"), (3, "third")] {
            h.store
                .insert_post(
                    Post::new(PostId::from_u128(id), t(1), content, now())
                        .scheduled_at(now() - Duration::minutes(1)),
                )
                .await;
        }
        h.publisher
            .fail_when("second", PublishError::transport("connection reset"));

        let report = h.driver.tick().await.report().cloned().unwrap();
        let tenant = report.tenant(t(1)).unwrap();
        assert_eq!(tenant.selected, 3);
        assert_eq!(tenant.published.len(), 2);
        assert_eq!(tenant.failed.len(), 1);
        assert!(matches!(
            &tenant.failed[0],
            ExecutionError::Publish { post_id, .. } if *post_id == PostId::from_u128(2)
        ));

        let second = h.store.get_post(t(1), PostId::from_u128(2)).await.unwrap().unwrap();
        assert!(second.is_inventory());
        assert!(second.scheduled_at.is_some());

        h.publisher.clear_failures();
        let report = h.driver.tick().await.report().cloned().unwrap();
        assert_eq!(report.counts().published, 1);
        assert_eq!(
            h.publisher.published_contents(),
            vec!["first", "second", "third", "second"]
        );
    }

    #[tokio::test]
    async fn missing_credentials_skip_only_that_tenant() {
        let h = harness(ScriptedPublisher::new()).await;
        add_tenant(&h, 1).await;
        h.store.insert_tenant(Tenant::new(t(2), "unconfigured")).await;
        for (id, tenant) in [(1, 1), (2, 2)] {
            h.store
                .insert_post(
                    Post::new(PostId::from_u128(id), t(tenant), format!("p{id}"), now())
                        .scheduled_at(now()),
                )
                .await;
        }

        let report = h.driver.tick().await.report().cloned().unwrap();

        let skipped = report.tenant(t(2)).unwrap();
        match &skipped.skipped {
            Some(TenantTickError::Configuration(err)) => {
                assert_eq!(err.missing, vec!["linkedin_access_token", "linkedin_urn"]);
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
        assert_eq!(report.tenant(t(1)).unwrap().published.len(), 1);
        assert!(h.store.get_post(t(2), PostId::from_u128(2)).await.unwrap().unwrap().is_inventory());
    }

    #[tokio::test]
    async fn tenant_without_candidates_needs_no_credentials() {
        let h = harness(ScriptedPublisher::new()).await;
        h.store.insert_tenant(Tenant::new(t(1), "quiet")).await;

        let report = h.driver.tick().await.report().cloned().unwrap();
        let tenant = report.tenant(t(1)).unwrap();
        assert!(tenant.skipped.is_none());
        assert_eq!(tenant.selected, 0);
    }

    #[tokio::test]
    async fn playlist_channel_publishes_in_creation_order_across_ticks() {
        let h = harness(ScriptedPublisher::new()).await;
        add_tenant(&h, 1).await;
        let playlist = PlaylistId::from_u128(9);
        h.store.insert_playlist(Playlist::new(playlist, t(1), "series")).await;
        h.store
            .insert_channel(Channel::playlist(ChannelId::from_u128(1), t(1), "series", playlist))
            .await;
        h.store
            .insert_post(
                Post::new(PostId::from_u128(2), t(1), "Y", now() - Duration::days(1))
                    .in_playlist(playlist)
                    .random_eligible(false),
            )
            .await;
        h.store
            .insert_post(
                Post::new(PostId::from_u128(1), t(1), "X", now() - Duration::days(2))
                    .in_playlist(playlist)
                    .random_eligible(false),
            )
            .await;

        h.driver.tick().await;
        assert_eq!(h.publisher.published_contents(), vec!["X"]);

        h.driver.tick().await;
        assert_eq!(h.publisher.published_contents(), vec!["X", "Y"]);

        let report = h.driver.tick().await.report().cloned().unwrap();
        assert_eq!(report.counts().selected, 0);
    }

    /// Store whose channel listing fails for one tenant.
    struct FlakyChannels {
        inner: Arc<InMemoryStore>,
        broken: TenantId,
    }

    #[async_trait::async_trait]
    impl Store for FlakyChannels {
        async fn list_tenants(&self) -> Result<Vec<TenantId>, StoreError> {
            self.inner.list_tenants().await
        }
        async fn find_posts(
            &self,
            tenant_id: TenantId,
            filter: &PostFilter,
        ) -> Result<Vec<Post>, StoreError> {
            self.inner.find_posts(tenant_id, filter).await
        }
        async fn get_post(
            &self,
            tenant_id: TenantId,
            post_id: PostId,
        ) -> Result<Option<Post>, StoreError> {
            self.inner.get_post(tenant_id, post_id).await
        }
        async fn active_channels(&self, tenant_id: TenantId) -> Result<Vec<Channel>, StoreError> {
            if tenant_id == self.broken {
                return Err(StoreError::Backend("connection refused".into()));
            }
            self.inner.active_channels(tenant_id).await
        }
        async fn get_playlist(
            &self,
            tenant_id: TenantId,
            playlist_id: PlaylistId,
        ) -> Result<Option<Playlist>, StoreError> {
            self.inner.get_playlist(tenant_id, playlist_id).await
        }
        async fn mark_posted(
            &self,
            tenant_id: TenantId,
            post_id: PostId,
            posted_at: DateTime<Utc>,
        ) -> Result<Post, StoreError> {
            self.inner.mark_posted(tenant_id, post_id, posted_at).await
        }
    }

    #[tokio::test]
    async fn selection_failure_skips_only_that_tenant() {
        let h = harness(ScriptedPublisher::new()).await;
        add_tenant(&h, 1).await;
        add_tenant(&h, 2).await;
        for (id, tenant) in [(1, 1), (2, 2)] {
            h.store
                .insert_post(
                    Post::new(PostId::from_u128(id), t(tenant), format!("p{id}"), now())
                        .scheduled_at(now()),
                )
                .await;
        }

        let store: Arc<dyn Store> = Arc::new(FlakyChannels {
            inner: h.store.clone(),
            broken: t(1),
        });
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
        let driver = TickDriver::new(
            store.clone(),
            h.credentials.clone(),
            CredentialKeys::default(),
            SelectionEngine::new(store.clone(), Arc::new(SeededRandom::new(5))),
            Executor::new(h.publisher.clone(), store, clock.clone()),
            clock,
        );

        let report = driver.tick().await.report().cloned().unwrap();
        assert!(matches!(
            report.tenant(t(1)).unwrap().skipped,
            Some(TenantTickError::Selection(_))
        ));
        assert_eq!(report.tenant(t(2)).unwrap().published.len(), 1);
        assert_eq!(h.publisher.published_contents(), vec!["p2"]);
    }

    /// Credential store that is unreachable for one tenant.
    struct FlakyCredentials {
        inner: Arc<InMemoryCredentialStore>,
        broken: TenantId,
    }

    #[async_trait::async_trait]
    impl CredentialStore for FlakyCredentials {
        async fn get(&self, tenant_id: TenantId) -> Result<TenantSecrets, StoreError> {
            if tenant_id == self.broken {
                return Err(StoreError::Backend("secret store timeout".into()));
            }
            self.inner.get(tenant_id).await
        }
    }

    #[tokio::test]
    async fn credential_lookup_failure_skips_only_that_tenant() {
        let h = harness(ScriptedPublisher::new()).await;
        add_tenant(&h, 1).await;
        add_tenant(&h, 2).await;
        for (id, tenant) in [(1, 1), (2, 2)] {
            h.store
                .insert_post(
                    Post::new(PostId::from_u128(id), t(tenant), format!("p{id}"), now())
                        .scheduled_at(now()),
                )
                .await;
        }

        let store: Arc<dyn Store> = h.store.clone();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
        let driver = TickDriver::new(
            store.clone(),
            Arc::new(FlakyCredentials {
                inner: h.credentials.clone(),
                broken: t(2),
            }),
            CredentialKeys::default(),
            SelectionEngine::new(store.clone(), Arc::new(SeededRandom::new(5))),
            Executor::new(h.publisher.clone(), store, clock.clone()),
            clock,
        );

        let report = driver.tick().await.report().cloned().unwrap();
        assert!(matches!(
            report.tenant(t(2)).unwrap().skipped,
            Some(TenantTickError::Credentials(StoreError::Backend(_)))
        ));
        assert_eq!(report.tenant(t(1)).unwrap().published.len(), 1);
        assert_eq!(h.publisher.published_contents(), vec!["p1"]);
        assert!(h.store.get_post(t(2), PostId::from_u128(2)).await.unwrap().unwrap().is_inventory());
    }

    #[tokio::test]
    async fn image_ref_is_passed_to_the_publisher() {
        let h = harness(ScriptedPublisher::new()).await;
        add_tenant(&h, 1).await;
        let image = ImageRef::new("https://cdn.example/launch.png");
        h.store
            .insert_post(
                Post::new(PostId::from_u128(1), t(1), "with image", now())
                    .with_image(image.clone())
                    .scheduled_at(now()),
            )
            .await;
        h.store
            .insert_post(Post::new(PostId::from_u128(2), t(1), "text only", now()).scheduled_at(now()))
            .await;

        h.driver.tick().await;

        let calls = h.publisher.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].image_ref, Some(image));
        assert_eq!(calls[0].author, "urn:li:organization:1");
        assert_eq!(calls[1].image_ref, None);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_tick_is_rejected() {
        let h = harness(ScriptedPublisher::new().with_delay(StdDuration::from_secs(10))).await;
        add_tenant(&h, 1).await;
        h.store
            .insert_post(Post::new(PostId::from_u128(1), t(1), "slow", now()).scheduled_at(now()))
            .await;

        let first = tokio::spawn({
            let driver = h.driver.clone();
            async move { driver.tick().await }
        });
        // let the first tick reach the publisher
        tokio::time::sleep(StdDuration::from_secs(1)).await;
        assert_eq!(h.driver.state(), DriverState::Running);

        assert_eq!(h.driver.tick().await, TickOutcome::Overlapped);

        let first = first.await.unwrap();
        assert_eq!(first.report().unwrap().counts().published, 1);
        assert_eq!(h.driver.state(), DriverState::Idle);
        assert_eq!(h.publisher.calls().len(), 1);
    }
}

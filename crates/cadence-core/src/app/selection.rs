//! SelectionEngine - 1 tenant・1 tick 分の publish 候補を決める
//!
//! # フロー
//! 1. precision batch: `scheduled_at <= now` かつ schedule 有効な inventory を全件（id 昇順）
//! 2. active channel ごと（channel id 昇順）に最大 1 件
//!    - playlist: playlist 内で最も古い未スケジュール post
//!    - random: random mode 対象の未スケジュール post から抽選
//! 3. 選ばれた post は tick ローカルの除外集合に入り、後続の channel からは見えない
//!
//! # 設計原則
//! - 読み取り専用（Store を書き換えない）
//! - 同じ Store 内容・同じ now・同じ seed なら同じ結果
//! - dangling playlist / 空 pool はエラーではなく「候補なし」

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{
    Channel, ChannelKind, PlaylistId, Post, PostId, PublishTask, StoreError, TaskSource,
    TenantId,
};
use crate::ports::{DrawScope, PostFilter, RandomSource, Store};

pub struct SelectionEngine {
    store: Arc<dyn Store>,
    random: Arc<dyn RandomSource>,
}

impl SelectionEngine {
    pub fn new(store: Arc<dyn Store>, random: Arc<dyn RandomSource>) -> Self {
        Self { store, random }
    }

    /// Ordered publish tasks for `tenant_id` at `now`.
    ///
    /// Precision-batch tasks come first, then at most one task per active
    /// channel. No post appears twice. Any store failure fails the whole
    /// selection, and the caller skips the tenant for this tick.
    pub async fn select_candidates(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<PublishTask>, StoreError> {
        let mut taken: HashSet<PostId> = HashSet::new();
        let mut tasks = Vec::new();

        let due = self.store.find_posts(tenant_id, &PostFilter::due(now)).await?;
        for post in due {
            if taken.insert(post.id) {
                tasks.push(PublishTask::from_post(&post, TaskSource::Precision));
            }
        }

        let channels = self.store.active_channels(tenant_id).await?;
        for channel in channels {
            if let Some(post) = self.pick_for_channel(tenant_id, &channel, now, &taken).await? {
                taken.insert(post.id);
                tasks.push(PublishTask::from_post(
                    &post,
                    TaskSource::Channel {
                        channel_id: channel.id,
                    },
                ));
            }
        }

        Ok(tasks)
    }

    async fn pick_for_channel(
        &self,
        tenant_id: TenantId,
        channel: &Channel,
        now: DateTime<Utc>,
        taken: &HashSet<PostId>,
    ) -> Result<Option<Post>, StoreError> {
        match channel.kind {
            ChannelKind::Playlist { playlist_id: None } => {
                debug!(tenant = %tenant_id, channel = %channel.id, "playlist channel has no playlist");
                Ok(None)
            }
            ChannelKind::Playlist {
                playlist_id: Some(playlist_id),
            } => self.next_in_playlist(tenant_id, channel, playlist_id, taken).await,
            ChannelKind::Random => {
                self.draw_random(tenant_id, channel, now, taken).await
            }
        }
    }

    async fn next_in_playlist(
        &self,
        tenant_id: TenantId,
        channel: &Channel,
        playlist_id: PlaylistId,
        taken: &HashSet<PostId>,
    ) -> Result<Option<Post>, StoreError> {
        if self.store.get_playlist(tenant_id, playlist_id).await?.is_none() {
            debug!(tenant = %tenant_id, channel = %channel.id, playlist = %playlist_id, "playlist no longer exists");
            return Ok(None);
        }

        let queue = self
            .store
            .find_posts(tenant_id, &PostFilter::playlist_queue(playlist_id))
            .await?;
        let next = queue.into_iter().find(|p| !taken.contains(&p.id));
        if next.is_none() {
            debug!(tenant = %tenant_id, channel = %channel.id, playlist = %playlist_id, "playlist exhausted");
        }
        Ok(next)
    }

    async fn draw_random(
        &self,
        tenant_id: TenantId,
        channel: &Channel,
        now: DateTime<Utc>,
        taken: &HashSet<PostId>,
    ) -> Result<Option<Post>, StoreError> {
        let mut pool: Vec<Post> = self
            .store
            .find_posts(tenant_id, &PostFilter::random_pool())
            .await?
            .into_iter()
            .filter(|p| !taken.contains(&p.id))
            .collect();
        if pool.is_empty() {
            debug!(tenant = %tenant_id, channel = %channel.id, "random pool is empty");
            return Ok(None);
        }

        let scope = DrawScope {
            tenant_id,
            channel_id: channel.id,
            now,
        };
        let index = self.random.choose_index(&scope, pool.len()).min(pool.len() - 1);
        Ok(Some(pool.swap_remove(index)))
    }
}

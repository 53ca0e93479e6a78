//! InMemoryStore - 開発用・テスト用の Store
//!
//! # 実装詳細
//! - 1 つの tokio Mutex で全状態を保護（クエリは短く、await を跨がない）
//! - 管理操作（tenant / playlist / channel / post の作成、playlist 削除、archive）は
//!   Store trait ではなく inherent method として提供
//! - playlist 削除は post の playlist_id を null にするだけで、channel には触れない

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    Channel, ChannelId, Playlist, PlaylistId, Post, PostId, PostStatus, StoreError, Tenant,
    TenantId,
};
use crate::ports::{PostFilter, Store};

#[derive(Default)]
struct InMemoryStoreState {
    tenants: BTreeMap<TenantId, Tenant>,
    posts: HashMap<PostId, Post>,
    channels: HashMap<ChannelId, Channel>,
    playlists: HashMap<PlaylistId, Playlist>,
}

impl InMemoryStoreState {
    fn post_mut(&mut self, tenant_id: TenantId, post_id: PostId) -> Result<&mut Post, StoreError> {
        self.posts
            .get_mut(&post_id)
            .filter(|p| p.tenant_id == tenant_id)
            .ok_or(StoreError::PostNotFound { tenant_id, post_id })
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<InMemoryStoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_tenant(&self, tenant: Tenant) {
        let mut state = self.state.lock().await;
        state.tenants.insert(tenant.id, tenant);
    }

    pub async fn insert_playlist(&self, playlist: Playlist) {
        let mut state = self.state.lock().await;
        state.playlists.insert(playlist.id, playlist);
    }

    pub async fn insert_channel(&self, channel: Channel) {
        let mut state = self.state.lock().await;
        state.channels.insert(channel.id, channel);
    }

    pub async fn insert_post(&self, post: Post) {
        let mut state = self.state.lock().await;
        state.posts.insert(post.id, post);
    }

    /// Delete a playlist and detach its posts.
    ///
    /// Channels pointing at it are left as they are; they simply stop yielding
    /// candidates. Returns whether the playlist existed.
    pub async fn delete_playlist(&self, tenant_id: TenantId, playlist_id: PlaylistId) -> bool {
        let mut state = self.state.lock().await;
        let existed = state
            .playlists
            .get(&playlist_id)
            .is_some_and(|p| p.tenant_id == tenant_id);
        if !existed {
            return false;
        }

        for post in state.posts.values_mut() {
            if post.tenant_id == tenant_id && post.playlist_id == Some(playlist_id) {
                post.playlist_id = None;
            }
        }
        state.playlists.remove(&playlist_id);
        true
    }

    pub async fn set_channel_active(
        &self,
        tenant_id: TenantId,
        channel_id: ChannelId,
        is_active: bool,
    ) -> bool {
        let mut state = self.state.lock().await;
        match state
            .channels
            .get_mut(&channel_id)
            .filter(|c| c.tenant_id == tenant_id)
        {
            Some(channel) => {
                channel.is_active = is_active;
                true
            }
            None => false,
        }
    }

    /// Manual inventory -> archived transition.
    pub async fn archive_post(&self, tenant_id: TenantId, post_id: PostId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let post = state.post_mut(tenant_id, post_id)?;
        if post.status != PostStatus::Inventory {
            return Err(StoreError::NotInInventory {
                post_id,
                status: format!("{:?}", post.status).to_lowercase(),
            });
        }
        post.status = PostStatus::Archived;
        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_tenants(&self) -> Result<Vec<TenantId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.tenants.keys().copied().collect())
    }

    async fn find_posts(
        &self,
        tenant_id: TenantId,
        filter: &PostFilter,
    ) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = {
            let state = self.state.lock().await;
            state
                .posts
                .values()
                .filter(|p| p.tenant_id == tenant_id && filter.matches(p))
                .cloned()
                .collect()
        };
        filter.sort(&mut posts);
        Ok(posts)
    }

    async fn get_post(
        &self,
        tenant_id: TenantId,
        post_id: PostId,
    ) -> Result<Option<Post>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .posts
            .get(&post_id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn active_channels(&self, tenant_id: TenantId) -> Result<Vec<Channel>, StoreError> {
        let mut channels: Vec<Channel> = {
            let state = self.state.lock().await;
            state
                .channels
                .values()
                .filter(|c| c.tenant_id == tenant_id && c.is_active)
                .cloned()
                .collect()
        };
        channels.sort_by_key(|c| c.id);
        Ok(channels)
    }

    async fn get_playlist(
        &self,
        tenant_id: TenantId,
        playlist_id: PlaylistId,
    ) -> Result<Option<Playlist>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .playlists
            .get(&playlist_id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn mark_posted(
        &self,
        tenant_id: TenantId,
        post_id: PostId,
        posted_at: DateTime<Utc>,
    ) -> Result<Post, StoreError> {
        let mut state = self.state.lock().await;
        let post = state.post_mut(tenant_id, post_id)?;
        if post.status != PostStatus::Inventory {
            return Err(StoreError::NotInInventory {
                post_id,
                status: format!("{:?}", post.status).to_lowercase(),
            });
        }
        post.mark_posted(posted_at);
        Ok(post.clone())
    }
}

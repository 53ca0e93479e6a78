//! Post - 配信対象のコンテンツ
//!
//! # 状態遷移
//! - Inventory -> Posted（publish 成功時、engine が行う）
//! - Inventory -> Archived（手動操作、engine の外）
//!
//! 逆方向の遷移はない。Posted になった post は playlist / schedule から切り離される。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PlaylistId, PostId, TenantId};

/// Post の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Created, not yet published, eligible for selection.
    Inventory,
    Posted,
    Archived,
}

impl PostStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, PostStatus::Posted | PostStatus::Archived)
    }
}

/// Opaque reference to an image attached to a post.
///
/// Either a fetchable location or an already registered remote media handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub tenant_id: TenantId,
    pub content: String,
    pub image_ref: Option<ImageRef>,
    pub status: PostStatus,

    /// Weak reference; nulled when the playlist is deleted.
    pub playlist_id: Option<PlaylistId>,

    /// Precision schedule. Posts with this set never enter channel pools.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub is_schedule_active: bool,
    pub is_random_mode_eligible: bool,

    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl Post {
    /// New inventory post. Random mode eligibility defaults to true.
    pub fn new(
        id: PostId,
        tenant_id: TenantId,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            content: content.into(),
            image_ref: None,
            status: PostStatus::Inventory,
            playlist_id: None,
            scheduled_at: None,
            is_schedule_active: false,
            is_random_mode_eligible: true,
            created_at,
            posted_at: None,
        }
    }

    pub fn with_image(mut self, image_ref: ImageRef) -> Self {
        self.image_ref = Some(image_ref);
        self
    }

    pub fn in_playlist(mut self, playlist_id: PlaylistId) -> Self {
        self.playlist_id = Some(playlist_id);
        self
    }

    /// Set a precision schedule and activate it.
    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self.is_schedule_active = true;
        self
    }

    pub fn schedule_active(mut self, active: bool) -> Self {
        self.is_schedule_active = active;
        self
    }

    pub fn random_eligible(mut self, eligible: bool) -> Self {
        self.is_random_mode_eligible = eligible;
        self
    }

    pub fn is_inventory(&self) -> bool {
        self.status == PostStatus::Inventory
    }

    /// Precision batch predicate: inventory, active schedule, due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_inventory()
            && self.is_schedule_active
            && self.scheduled_at.is_some_and(|at| at <= now)
    }

    /// Mark as posted and detach from every future selection.
    pub fn mark_posted(&mut self, posted_at: DateTime<Utc>) {
        self.status = PostStatus::Posted;
        self.posted_at = Some(posted_at);
        self.playlist_id = None;
        self.scheduled_at = None;
    }
}

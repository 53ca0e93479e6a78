//! Store port - tenant スコープの正本（source of truth）
//!
//! Store は以下を管理します：
//! - Post（engine が読み書きする唯一のエンティティ）
//! - Channel / Playlist（engine は読むだけ）
//!
//! # 設計原則
//! - すべてのクエリは TenantId を必須引数に取る（tenant をまたぐ読み書きはない）
//! - `mark_posted` は status / posted_at / playlist_id / scheduled_at を 1 回の更新で書く
//! - 実装はロックを publish 呼び出しの間保持しない（engine は read → publish → write の順で呼ぶ）

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Channel, PlaylistId, Playlist, Post, PostId, PostStatus, StoreError, TenantId,
};

/// Filter on `scheduled_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScheduleFilter {
    #[default]
    Any,
    Absent,
    /// Present and `<= at`.
    DueBy(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
    #[default]
    IdAsc,
    /// `created_at` ascending, id as tie-break.
    CreatedAtAsc,
}

/// Conjunctive post query. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub scheduled: ScheduleFilter,
    pub schedule_active: Option<bool>,
    pub playlist_id: Option<PlaylistId>,
    pub random_eligible: Option<bool>,
    pub order: PostOrder,
}

impl PostFilter {
    /// Inventory posts with an active schedule due at `now`.
    pub fn due(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(PostStatus::Inventory),
            scheduled: ScheduleFilter::DueBy(now),
            schedule_active: Some(true),
            order: PostOrder::IdAsc,
            ..Self::default()
        }
    }

    /// Unscheduled inventory posts of a playlist, oldest first.
    pub fn playlist_queue(playlist_id: PlaylistId) -> Self {
        Self {
            status: Some(PostStatus::Inventory),
            scheduled: ScheduleFilter::Absent,
            playlist_id: Some(playlist_id),
            order: PostOrder::CreatedAtAsc,
            ..Self::default()
        }
    }

    /// Unscheduled inventory posts open to random discovery.
    pub fn random_pool() -> Self {
        Self {
            status: Some(PostStatus::Inventory),
            scheduled: ScheduleFilter::Absent,
            random_eligible: Some(true),
            order: PostOrder::IdAsc,
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }
        let scheduled_ok = match self.scheduled {
            ScheduleFilter::Any => true,
            ScheduleFilter::Absent => post.scheduled_at.is_none(),
            ScheduleFilter::DueBy(at) => post.scheduled_at.is_some_and(|s| s <= at),
        };
        if !scheduled_ok {
            return false;
        }
        if self.schedule_active.is_some_and(|a| a != post.is_schedule_active) {
            return false;
        }
        if self.playlist_id.is_some() && self.playlist_id != post.playlist_id {
            return false;
        }
        if self
            .random_eligible
            .is_some_and(|r| r != post.is_random_mode_eligible)
        {
            return false;
        }
        true
    }

    /// Sort posts in the order this filter asks for.
    pub fn sort(&self, posts: &mut [Post]) {
        match self.order {
            PostOrder::IdAsc => posts.sort_by_key(|p| p.id),
            PostOrder::CreatedAtAsc => posts.sort_by_key(|p| (p.created_at, p.id)),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Every tenant the tick driver should visit.
    async fn list_tenants(&self) -> Result<Vec<TenantId>, StoreError>;

    async fn find_posts(
        &self,
        tenant_id: TenantId,
        filter: &PostFilter,
    ) -> Result<Vec<Post>, StoreError>;

    async fn get_post(
        &self,
        tenant_id: TenantId,
        post_id: PostId,
    ) -> Result<Option<Post>, StoreError>;

    /// Active channels, ascending id.
    async fn active_channels(&self, tenant_id: TenantId) -> Result<Vec<Channel>, StoreError>;

    async fn get_playlist(
        &self,
        tenant_id: TenantId,
        playlist_id: PlaylistId,
    ) -> Result<Option<Playlist>, StoreError>;

    /// Atomically set status=posted, posted_at, and clear playlist_id / scheduled_at.
    ///
    /// Fails with `StoreError::NotInInventory` if the post already left inventory.
    async fn mark_posted(
        &self,
        tenant_id: TenantId,
        post_id: PostId,
        posted_at: DateTime<Utc>,
    ) -> Result<Post, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn post(id: u128) -> Post {
        Post::new(PostId::from_u128(id), TenantId::from_u128(1), "x", now())
    }

    #[rstest]
    #[case::due(post(1).scheduled_at(now() - Duration::hours(1)), true)]
    #[case::future(post(1).scheduled_at(now() + Duration::hours(1)), false)]
    #[case::paused(post(1).scheduled_at(now()).schedule_active(false), false)]
    #[case::unscheduled(post(1), false)]
    fn due_filter(#[case] p: Post, #[case] expected: bool) {
        assert_eq!(PostFilter::due(now()).matches(&p), expected);
    }

    #[test]
    fn playlist_queue_excludes_scheduled_posts() {
        let playlist = PlaylistId::from_u128(9);
        let filter = PostFilter::playlist_queue(playlist);

        assert!(filter.matches(&post(1).in_playlist(playlist)));
        assert!(!filter.matches(&post(2).in_playlist(playlist).scheduled_at(now())));
        assert!(!filter.matches(&post(3).in_playlist(PlaylistId::from_u128(10))));
        assert!(!filter.matches(&post(4)));
    }

    #[test]
    fn random_pool_requires_eligibility() {
        let filter = PostFilter::random_pool();
        assert!(filter.matches(&post(1)));
        assert!(!filter.matches(&post(2).random_eligible(false)));
        assert!(!filter.matches(&post(3).scheduled_at(now())));

        let mut posted = post(4);
        posted.mark_posted(now());
        assert!(!filter.matches(&posted));
    }

    #[test]
    fn created_at_order_breaks_ties_by_id() {
        let mut posts = vec![
            Post {
                created_at: now(),
                ..post(3)
            },
            Post {
                created_at: now() - Duration::days(1),
                ..post(5)
            },
            Post {
                created_at: now(),
                ..post(2)
            },
        ];
        PostFilter::playlist_queue(PlaylistId::from_u128(1)).sort(&mut posts);

        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![PostId::from_u128(5), PostId::from_u128(2), PostId::from_u128(3)]
        );
    }
}

//! IdGenerator port - ID 生成の抽象化
//!
//! エンティティを作る側（取り込み・管理操作・デモデータ）が使う。engine 自体は ID を作らない。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{ChannelId, PlaylistId, PostId, TenantId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は分散システムで使える ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数スレッドから使える）
pub trait IdGenerator: Send + Sync {
    fn generate_tenant_id(&self) -> TenantId;

    fn generate_post_id(&self) -> PostId;

    fn generate_channel_id(&self) -> ChannelId;

    fn generate_playlist_id(&self) -> PlaylistId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って現在時刻ベースの ULID を生成します。
/// FixedClock を使えば timestamp 部分が固定されます。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_tenant_id(&self) -> TenantId {
        TenantId::from(self.next_ulid())
    }

    fn generate_post_id(&self) -> PostId {
        PostId::from(self.next_ulid())
    }

    fn generate_channel_id(&self) -> ChannelId {
        ChannelId::from(self.next_ulid())
    }

    fn generate_playlist_id(&self) -> PlaylistId {
        PlaylistId::from(self.next_ulid())
    }
}

//! Domain identifiers (strongly-typed IDs).
//!
//! すべてのエンティティ ID は ULID ベースです。
//! Phantom type パターンで `Id<T>` の共通実装を提供しつつ、
//! `PostId` と `ChannelId` のような異なる ID を混同できないようにしています。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 生成順序でソートできる（precision batch の「id 昇順」に使う）
//! - **分散生成可能**: 調整なしで複数ノードで生成できる
//! - **UUID互換**: 128-bit

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"tenant-", "post-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しません。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// ULID から Id を作成
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 固定値から Id を作成（fixture・デモデータ用）
    ///
    /// 小さい値ほど小さい ID になるので、テストで並び順を明示できる。
    pub fn from_u128(value: u128) -> Self {
        Self::from_ulid(Ulid::from_bytes(value.to_be_bytes()))
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Tenant のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tenant {}

impl IdMarker for Tenant {
    fn prefix() -> &'static str {
        "tenant-"
    }
}

/// Post のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Post {}

impl IdMarker for Post {
    fn prefix() -> &'static str {
        "post-"
    }
}

/// Channel のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {}

impl IdMarker for Channel {
    fn prefix() -> &'static str {
        "channel-"
    }
}

/// Playlist のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Playlist {}

impl IdMarker for Playlist {
    fn prefix() -> &'static str {
        "playlist-"
    }
}

// ========================================
// Type Alias
// ========================================

/// Identifier of a Tenant (isolation boundary for every store query).
pub type TenantId = Id<Tenant>;

/// Identifier of a Post (content item).
pub type PostId = Id<Post>;

/// Identifier of a Channel (distribution stream).
pub type ChannelId = Id<Channel>;

/// Identifier of a Playlist (named grouping of posts).
pub type PlaylistId = Id<Playlist>;

//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryStore**: テスト・デモ用の正本
//! - **InMemoryCredentialStore**: 平文の secret 保存
//! - **MediaPublisher**: MediaApi の 4 ステップを束ねる Publisher
//! - **ScriptedPublisher**: 呼び出し記録と失敗注入ができる Publisher
//!
//! 本番用の Store / MediaApi 実装は別クレートに置く想定。

pub mod inmem_store;
pub mod inmem_credentials;
pub mod media_publisher;
pub mod scripted_publisher;

pub use self::inmem_store::InMemoryStore;
pub use self::inmem_credentials::InMemoryCredentialStore;
pub use self::media_publisher::MediaPublisher;
pub use self::scripted_publisher::{PublishCall, ScriptedPublisher};

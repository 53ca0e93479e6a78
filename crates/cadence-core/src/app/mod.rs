//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **SchedulerBuilder**: 構築とワイヤリング
//! - **Scheduler**: tick を一定間隔で回すループ
//! - **TickDriver**: 1 回の tick（tenant ごとに selection → credential → execute）
//! - **SelectionEngine**: 今 publish すべき post の決定（読み取りのみ）
//! - **Executor**: publish してから commit
//! - **GuardedPublisher**: timeout と in-call retry

pub mod builder;
pub mod scheduler;
pub mod tick;
pub mod selection;
pub mod execution;
pub mod publish_guard;
pub mod retry;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, SchedulerBuilder};
pub use self::scheduler::{Scheduler, SchedulerHandle, next_fire_delay};
pub use self::tick::{DriverState, TickDriver};
pub use self::selection::SelectionEngine;
pub use self::execution::Executor;
pub use self::publish_guard::GuardedPublisher;
pub use self::retry::RetryPolicy;

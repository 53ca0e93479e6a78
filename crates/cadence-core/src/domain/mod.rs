//! Domain model (IDs, entities, tasks, errors, reports).
//!
//! - ids: 型付き ULID ID（TenantId, PostId, ChannelId, PlaylistId）
//! - post / channel / playlist: Store が保持するエンティティ
//! - task: 1 tick 内の publish 候補（PublishTask）
//! - errors: エラー分類
//! - report: tick の結果

pub mod ids;
pub mod post;
pub mod channel;
pub mod playlist;
pub mod task;
pub mod errors;
pub mod report;

pub use self::ids::{ChannelId, PlaylistId, PostId, TenantId};
pub use self::post::{ImageRef, Post, PostStatus};
pub use self::channel::{Channel, ChannelKind, InvalidScheduledTime, ScheduleType, ScheduledTime};
pub use self::playlist::{Playlist, Tenant};
pub use self::task::{PublishTask, TaskSource};
pub use self::errors::{
    ConfigurationError, ExecutionError, PublishError, StoreError, TenantTickError,
};
pub use self::report::{Published, TenantReport, TickCounts, TickOutcome, TickReport};

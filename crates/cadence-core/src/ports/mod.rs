//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（DB, SNS API, secret 保存先）や環境（時刻・乱数）への
//! インターフェースを提供し、engine をそれらから切り離します。

pub mod store;
pub mod publisher;
pub mod credentials;
pub mod clock;
pub mod random;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::store::{PostFilter, PostOrder, ScheduleFilter, Store};
pub use self::publisher::{
    MediaApi, MediaHandle, PublishCredentials, Publisher, RemoteId, UploadTarget,
};
pub use self::credentials::{CredentialKeys, CredentialStore, TenantSecrets};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::random::{DrawScope, RandomSource, SeededRandom, ThreadRandom};
pub use self::id_generator::{IdGenerator, UlidGenerator};

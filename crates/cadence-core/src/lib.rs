//! cadence-core
//!
//! Core building blocks for the Cadence content distribution scheduler.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, post, channel, playlist, task, errors, report）
//! - **ports**: 抽象化レイヤー（Store, Publisher, MediaApi, CredentialStore, Clock, RandomSource, IdGenerator）
//! - **app**: アプリケーションロジック（builder, scheduler, tick, selection, execution）
//! - **impls**: 実装（InMemoryStore, MediaPublisher など開発用）
//! - **config**: SchedulerConfig（JSON + `CADENCE_*` 環境変数）

pub mod domain;
pub mod ports;
pub mod app;
pub mod impls;
pub mod config;

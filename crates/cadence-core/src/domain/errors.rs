//! Errors - エラー型と分類
//!
//! # 分類
//! - **ConfigurationError**: tenant の credential 不足。その tenant の tick だけを skip
//! - **PublishError::Remote**: 外部 API の非成功レスポンス。post は inventory のまま
//! - **PublishError::Transport / Timeout**: ネットワーク障害。Remote と同じ扱い
//! - **StoreError**: 永続化層の障害
//!
//! dangling playlist や空の random pool はエラーではない（selection で静かに skip する）。
//! どのエラーもプロセスを止めない。

use std::time::Duration;

use thiserror::Error;

use super::ids::{PostId, TenantId};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("post {post_id} not found for {tenant_id}")]
    PostNotFound { tenant_id: TenantId, post_id: PostId },

    /// The post is no longer in inventory (already posted or archived).
    #[error("post {post_id} cannot be marked posted: already {status}")]
    NotInInventory { post_id: PostId, status: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Failure of a single remote publish.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    /// Non-success response from the remote service.
    #[error("remote api error: status={status} {message}")]
    Remote { status: u16, message: String },

    /// Network-level failure reaching the remote service.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("publish timed out after {0:?}")]
    Timeout(Duration),
}

impl PublishError {
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Transport-class failures, including timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(self, PublishError::Transport(_) | PublishError::Timeout(_))
    }

    /// Whether the same call may be repeated within the tick.
    ///
    /// Only a plain transport failure qualifies. A timed-out call may already
    /// have created the post remotely, and a remote rejection will not change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::Transport(_))
    }
}

/// Required tenant credentials are absent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{tenant_id} is missing credentials: {}", .missing.join(", "))]
pub struct ConfigurationError {
    pub tenant_id: TenantId,
    pub missing: Vec<String>,
}

/// Failure of one publish-and-commit step.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("publish of {post_id} failed: {source}")]
    Publish {
        post_id: PostId,
        #[source]
        source: PublishError,
    },

    /// Publish went through but the commit did not land.
    #[error("commit of {post_id} failed after publish (remote_id={remote_id}): {source}")]
    Commit {
        post_id: PostId,
        remote_id: String,
        #[source]
        source: StoreError,
    },
}

impl ExecutionError {
    pub fn post_id(&self) -> PostId {
        match self {
            ExecutionError::Publish { post_id, .. } | ExecutionError::Commit { post_id, .. } => {
                *post_id
            }
        }
    }
}

/// Reason a whole tenant was skipped in a tick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenantTickError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("selection failed: {0}")]
    Selection(#[source] StoreError),

    #[error("credential lookup failed: {0}")]
    Credentials(#[source] StoreError),
}

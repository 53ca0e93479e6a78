use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ChannelId, PostId, TenantId};
use super::post::{ImageRef, Post};

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskSource {
    /// Post-level exact schedule that has come due.
    Precision,
    /// Picked by a channel stream.
    Channel { channel_id: ChannelId },
}

impl fmt::Display for TaskSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSource::Precision => f.write_str("precision"),
            TaskSource::Channel { channel_id } => write!(f, "{channel_id}"),
        }
    }
}

/// A post selected for an attempted publish within the current tick.
///
/// Carries a snapshot of what must be sent so execution does not re-read the
/// post before publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishTask {
    tenant_id: TenantId,
    post_id: PostId,
    content: String,
    image_ref: Option<ImageRef>,
    source: TaskSource,
}

impl PublishTask {
    pub fn from_post(post: &Post, source: TaskSource) -> Self {
        Self {
            tenant_id: post.tenant_id,
            post_id: post.id,
            content: post.content.clone(),
            image_ref: post.image_ref.clone(),
            source,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image_ref(&self) -> Option<&ImageRef> {
        self.image_ref.as_ref()
    }

    pub fn source(&self) -> TaskSource {
        self.source
    }
}

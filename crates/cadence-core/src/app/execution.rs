//! Executor - publish してから commit する
//!
//! # フロー
//! 1. Publisher::publish（ロックは持たない）
//! 2. 成功したら Store::mark_posted を 1 回だけ呼ぶ
//! 3. 失敗したら何も書かない（post は inventory のまま、次の tick で再選択される）

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{ExecutionError, PublishTask, Published};
use crate::ports::{Clock, PublishCredentials, Publisher, Store};

pub struct Executor {
    publisher: Arc<dyn Publisher>,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl Executor {
    pub fn new(publisher: Arc<dyn Publisher>, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            publisher,
            store,
            clock,
        }
    }

    /// Publish one task and commit the result.
    pub async fn execute(
        &self,
        task: &PublishTask,
        credentials: &PublishCredentials,
    ) -> Result<Published, ExecutionError> {
        let post_id = task.post_id();

        let remote_id = self
            .publisher
            .publish(task.content(), task.image_ref(), credentials)
            .await
            .map_err(|source| {
                warn!(
                    tenant = %task.tenant_id(),
                    post = %post_id,
                    source = %task.source(),
                    error = %source,
                    "publish failed; post stays in inventory"
                );
                ExecutionError::Publish { post_id, source }
            })?;

        let posted_at = self.clock.now();
        if let Err(source) = self
            .store
            .mark_posted(task.tenant_id(), post_id, posted_at)
            .await
        {
            // The remote post exists but the commit did not land. The post will
            // be selected again and published a second time.
            warn!(
                tenant = %task.tenant_id(),
                post = %post_id,
                remote_id = %remote_id,
                error = %source,
                "commit failed after publish"
            );
            return Err(ExecutionError::Commit {
                post_id,
                remote_id,
                source,
            });
        }

        info!(
            tenant = %task.tenant_id(),
            post = %post_id,
            source = %task.source(),
            remote_id = %remote_id,
            "published"
        );
        Ok(Published {
            post_id,
            remote_id,
            source: task.source(),
        })
    }
}

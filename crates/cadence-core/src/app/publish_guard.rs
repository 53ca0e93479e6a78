//! GuardedPublisher - Publisher に timeout と in-call retry を被せる
//!
//! # 学習ポイント
//! - `tokio::time::timeout` で 1 回の remote 呼び出しを上限付きにする
//! - in-call retry は Transport だけ。Timeout は remote 側で post が作られている可能性があるので繰り返さない
//! - decorator パターン（GuardedPublisher 自身も Publisher）
//!
//! 応答しない remote が 1 件あっても tick 全体が止まらないようにするのが目的。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::retry::RetryPolicy;
use crate::domain::{ImageRef, PublishError};
use crate::ports::{PublishCredentials, Publisher, RemoteId};

pub struct GuardedPublisher {
    inner: Arc<dyn Publisher>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GuardedPublisher {
    pub fn new(inner: Arc<dyn Publisher>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            inner,
            timeout,
            retry,
        }
    }

    async fn attempt(
        &self,
        content: &str,
        image_ref: Option<&ImageRef>,
        credentials: &PublishCredentials,
    ) -> Result<RemoteId, PublishError> {
        match tokio::time::timeout(
            self.timeout,
            self.inner.publish(content, image_ref, credentials),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(PublishError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl Publisher for GuardedPublisher {
    async fn publish(
        &self,
        content: &str,
        image_ref: Option<&ImageRef>,
        credentials: &PublishCredentials,
    ) -> Result<RemoteId, PublishError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(content, image_ref, credentials).await {
                Ok(remote_id) => return Ok(remote_id),
                Err(err) if err.is_retryable() && self.retry.allows_retry(attempts) => {
                    let delay = self.retry.next_delay(attempts);
                    debug!(attempts, ?delay, error = %err, "retrying publish");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::impls::ScriptedPublisher;

    fn creds() -> PublishCredentials {
        PublishCredentials {
            access_token: "tok".into(),
            author: "me".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_publish_times_out() {
        let inner = Arc::new(ScriptedPublisher::new().with_delay(Duration::from_secs(60)));
        let guarded = GuardedPublisher::new(inner, Duration::from_secs(30), RetryPolicy::default());

        let err = guarded.publish("a", None, &creds()).await.unwrap_err();
        assert_eq!(err, PublishError::Timeout(Duration::from_secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_are_retried_up_to_max_attempts() {
        let inner = Arc::new(ScriptedPublisher::new());
        inner.fail_times("a", 2, PublishError::transport("reset"));
        let guarded = GuardedPublisher::new(
            inner.clone(),
            Duration::from_secs(30),
            RetryPolicy::default().with_max_attempts(3),
        );

        assert!(guarded.publish("a", None, &creds()).await.is_ok());
        assert_eq!(inner.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn runaway_backoff_does_not_abort_the_publish() {
        let config = SchedulerConfig::from_json_str(
            r#"{ "retry": { "max_attempts": 3, "multiplier": 1e300 } }"#,
        )
        .unwrap();
        let inner = Arc::new(ScriptedPublisher::new());
        inner.fail_times("a", 2, PublishError::transport("reset"));
        let guarded =
            GuardedPublisher::new(inner.clone(), config.publish_timeout(), config.retry_policy());

        assert_eq!(guarded.publish("a", None, &creds()).await, Ok("remote-1".to_string()));
        assert_eq!(inner.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_publish_is_not_repeated() {
        let inner = Arc::new(ScriptedPublisher::new().with_delay(Duration::from_secs(60)));
        let guarded = GuardedPublisher::new(
            inner.clone(),
            Duration::from_secs(30),
            RetryPolicy::default().with_max_attempts(3),
        );

        let err = guarded.publish("a", None, &creds()).await.unwrap_err();
        assert_eq!(err, PublishError::Timeout(Duration::from_secs(30)));
        assert_eq!(inner.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_rejections_are_not_retried() {
        let inner = Arc::new(ScriptedPublisher::new());
        inner.fail_when("a", PublishError::remote(422, "duplicate"));
        let guarded = GuardedPublisher::new(
            inner.clone(),
            Duration::from_secs(30),
            RetryPolicy::default().with_max_attempts(3),
        );

        assert!(guarded.publish("a", None, &creds()).await.is_err());
        assert_eq!(inner.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_policy_gives_up_immediately() {
        let inner = Arc::new(ScriptedPublisher::new());
        inner.fail_times("a", 1, PublishError::transport("reset"));
        let guarded =
            GuardedPublisher::new(inner.clone(), Duration::from_secs(30), RetryPolicy::default());

        assert_eq!(
            guarded.publish("a", None, &creds()).await,
            Err(PublishError::transport("reset"))
        );
        assert_eq!(inner.calls().len(), 1);
    }
}

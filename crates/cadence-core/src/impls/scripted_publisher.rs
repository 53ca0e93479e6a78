//! ScriptedPublisher - テスト・デモ用の Publisher
//!
//! 呼び出しを記録し、content ごとに失敗を仕込める。遅延を入れて timeout や
//! tick の重なりも再現できる。

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ImageRef, PublishError};
use crate::ports::{PublishCredentials, Publisher, RemoteId};

/// One recorded publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCall {
    pub content: String,
    pub image_ref: Option<ImageRef>,
    pub author: String,
}

#[derive(Debug, Clone)]
struct ScriptedFailure {
    error: PublishError,
    /// `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Default)]
pub struct ScriptedPublisher {
    calls: Mutex<Vec<PublishCall>>,
    failures: Mutex<HashMap<String, ScriptedFailure>>,
    delay: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
}

impl ScriptedPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every publish sleeps this long before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
        self
    }

    /// Fail every publish of `content` until cleared.
    pub fn fail_when(&self, content: impl Into<String>, error: PublishError) {
        self.script(content.into(), error, None);
    }

    /// Fail the next `times` publishes of `content`, then succeed.
    pub fn fail_times(&self, content: impl Into<String>, times: usize, error: PublishError) {
        self.script(content.into(), error, Some(times));
    }

    pub fn clear_failures(&self) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn published_contents(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.content).collect()
    }

    fn script(&self, content: String, error: PublishError, remaining: Option<usize>) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(content, ScriptedFailure { error, remaining });
    }

    fn take_failure(&self, content: &str) -> Option<PublishError> {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let failure = failures.get_mut(content)?;
        match failure.remaining.as_mut() {
            None => Some(failure.error.clone()),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(failure.error.clone())
            }
        }
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    async fn publish(
        &self,
        content: &str,
        image_ref: Option<&ImageRef>,
        credentials: &PublishCredentials,
    ) -> Result<RemoteId, PublishError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublishCall {
                content: content.to_string(),
                image_ref: image_ref.cloned(),
                author: credentials.author.clone(),
            });

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.take_failure(content) {
            return Err(error);
        }
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("remote-{n}"))
    }
}

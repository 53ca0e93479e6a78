//! MediaPublisher - MediaApi の 4 ステップを順番通りに呼ぶ Publisher
//!
//! # フロー（画像あり）
//! 1. fetch_image
//! 2. register_upload → media handle
//! 3. upload
//! 4. create_post(media handle)
//!
//! image_ref が既に media handle（prefix 一致）の場合は 1〜3 を飛ばしてそのまま添付する。
//! どのステップで失敗してもそこで止まり、後続のステップは呼ばない。

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{ImageRef, PublishError};
use crate::ports::{MediaApi, MediaHandle, PublishCredentials, Publisher, RemoteId};

pub struct MediaPublisher<A> {
    api: A,
    media_handle_prefix: String,
}

impl<A: MediaApi> MediaPublisher<A> {
    pub fn new(api: A, media_handle_prefix: impl Into<String>) -> Self {
        Self {
            api,
            media_handle_prefix: media_handle_prefix.into(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn existing_handle(&self, image_ref: &ImageRef) -> Option<MediaHandle> {
        (!self.media_handle_prefix.is_empty()
            && image_ref.as_str().starts_with(&self.media_handle_prefix))
        .then(|| MediaHandle::new(image_ref.as_str()))
    }

    async fn upload_image(
        &self,
        image_ref: &ImageRef,
        credentials: &PublishCredentials,
    ) -> Result<MediaHandle, PublishError> {
        let bytes = self.api.fetch_image(image_ref).await?;
        let target = self.api.register_upload(credentials).await?;
        debug!(
            image = %image_ref,
            media = target.media_handle.as_str(),
            size = bytes.len(),
            "uploading image"
        );
        self.api.upload(&target, bytes, credentials).await?;
        Ok(target.media_handle)
    }
}

#[async_trait]
impl<A: MediaApi> Publisher for MediaPublisher<A> {
    async fn publish(
        &self,
        content: &str,
        image_ref: Option<&ImageRef>,
        credentials: &PublishCredentials,
    ) -> Result<RemoteId, PublishError> {
        let media = match image_ref {
            None => None,
            Some(image_ref) => match self.existing_handle(image_ref) {
                Some(handle) => Some(handle),
                None => Some(self.upload_image(image_ref, credentials).await?),
            },
        };
        self.api.create_post(content, media.as_ref(), credentials).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::UploadTarget;
    use std::sync::Mutex;

    /// Records every call so the test can check ordering.
    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<String>>,
        fail_at: Option<&'static str>,
    }

    impl RecordingApi {
        fn failing_at(step: &'static str) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::default()
            }
        }

        fn record(&self, step: &'static str, detail: String) -> Result<(), PublishError> {
            self.calls.lock().unwrap().push(format!("{step}:{detail}"));
            if self.fail_at == Some(step) {
                return Err(PublishError::remote(500, format!("{step} failed")));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MediaApi for RecordingApi {
        async fn fetch_image(&self, image_ref: &ImageRef) -> Result<Vec<u8>, PublishError> {
            self.record("fetch", image_ref.to_string())?;
            Ok(vec![1, 2, 3])
        }

        async fn register_upload(
            &self,
            credentials: &PublishCredentials,
        ) -> Result<UploadTarget, PublishError> {
            self.record("register", credentials.author.clone())?;
            Ok(UploadTarget {
                upload_url: "https://upload.example/1".into(),
                media_handle: MediaHandle::new("urn:li:image:1"),
            })
        }

        async fn upload(
            &self,
            target: &UploadTarget,
            bytes: Vec<u8>,
            _credentials: &PublishCredentials,
        ) -> Result<(), PublishError> {
            self.record("upload", format!("{}:{}", target.upload_url, bytes.len()))
        }

        async fn create_post(
            &self,
            content: &str,
            media: Option<&MediaHandle>,
            _credentials: &PublishCredentials,
        ) -> Result<RemoteId, PublishError> {
            let media = media.map(|m| m.as_str().to_string()).unwrap_or_default();
            self.record("create", format!("{content}:{media}"))?;
            Ok("remote-1".into())
        }
    }

    fn creds() -> PublishCredentials {
        PublishCredentials {
            access_token: "tok".into(),
            author: "urn:li:organization:1".into(),
        }
    }

    #[tokio::test]
    async fn text_post_skips_media_steps() {
        let publisher = MediaPublisher::new(RecordingApi::default(), "urn:li:");
        let id = publisher.publish("hello", None, &creds()).await.unwrap();

        assert_eq!(id, "remote-1");
        assert_eq!(publisher.api().calls(), vec!["create:hello:"]);
    }

    #[tokio::test]
    async fn image_post_runs_four_steps_in_order() {
        let publisher = MediaPublisher::new(RecordingApi::default(), "urn:li:");
        let image = ImageRef::new("https://cdn.example/cat.png");

        publisher.publish("hello", Some(&image), &creds()).await.unwrap();

        assert_eq!(
            publisher.api().calls(),
            vec![
                "fetch:https://cdn.example/cat.png",
                "register:urn:li:organization:1",
                "upload:https://upload.example/1:3",
                "create:hello:urn:li:image:1",
            ]
        );
    }

    #[tokio::test]
    async fn registered_handle_is_attached_directly() {
        let publisher = MediaPublisher::new(RecordingApi::default(), "urn:li:");
        let image = ImageRef::new("urn:li:image:99");

        publisher.publish("hello", Some(&image), &creds()).await.unwrap();

        assert_eq!(publisher.api().calls(), vec!["create:hello:urn:li:image:99"]);
    }

    #[tokio::test]
    async fn failure_stops_the_sequence() {
        let publisher = MediaPublisher::new(RecordingApi::failing_at("register"), "urn:li:");
        let image = ImageRef::new("https://cdn.example/cat.png");

        let err = publisher.publish("hello", Some(&image), &creds()).await.unwrap_err();

        assert!(matches!(err, PublishError::Remote { status: 500, .. }));
        assert_eq!(
            publisher.api().calls(),
            vec!["fetch:https://cdn.example/cat.png", "register:urn:li:organization:1"]
        );
    }
}

//! Publisher port - 外部 SNS への publish
//!
//! engine から見えるのは `Publisher::publish` だけ。
//! 画像付き post のアップロード手順は `MediaApi` に分解し、`impls::MediaPublisher` が順序を保証する：
//!
//! 1. `fetch_image`: image_ref が指すバイナリを取得
//! 2. `register_upload`: リモートにアップロード先を登録して media handle を得る
//! 3. `upload`: バイナリをアップロード先に送る
//! 4. `create_post`: media handle を参照する post を作成
//!
//! wire format はこの crate の範囲外。

use async_trait::async_trait;

use crate::domain::{ImageRef, PublishError};

/// Identifier the remote service assigned to a created post.
pub type RemoteId = String;

/// Opaque handle of a media asset registered with the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle(String);

impl MediaHandle {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where to send the image bytes, and the handle they will be known by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub upload_url: String,
    pub media_handle: MediaHandle,
}

/// Tenant secrets needed for one publish.
#[derive(Clone, PartialEq, Eq)]
pub struct PublishCredentials {
    pub access_token: String,
    /// Account the post is published as.
    pub author: String,
}

impl std::fmt::Debug for PublishCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishCredentials")
            .field("access_token", &"***")
            .field("author", &self.author)
            .finish()
    }
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        content: &str,
        image_ref: Option<&ImageRef>,
        credentials: &PublishCredentials,
    ) -> Result<RemoteId, PublishError>;
}

/// The remote service's four media/post primitives.
#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn fetch_image(&self, image_ref: &ImageRef) -> Result<Vec<u8>, PublishError>;

    async fn register_upload(
        &self,
        credentials: &PublishCredentials,
    ) -> Result<UploadTarget, PublishError>;

    async fn upload(
        &self,
        target: &UploadTarget,
        bytes: Vec<u8>,
        credentials: &PublishCredentials,
    ) -> Result<(), PublishError>;

    async fn create_post(
        &self,
        content: &str,
        media: Option<&MediaHandle>,
        credentials: &PublishCredentials,
    ) -> Result<RemoteId, PublishError>;
}

//! デモ用のデータセットと、送信せずにログに出すだけの MediaApi

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use cadence_core::domain::{Channel, ImageRef, Playlist, Post, PublishError, Tenant};
use cadence_core::impls::{InMemoryCredentialStore, InMemoryStore};
use cadence_core::ports::{
    Clock, IdGenerator, MediaApi, MediaHandle, PublishCredentials, RemoteId, TenantSecrets,
    UploadTarget,
};
use chrono::Duration;
use tracing::info;

/// MediaApi that logs every call instead of talking to a remote service.
#[derive(Default)]
pub struct LoggingMediaApi {
    next: AtomicU64,
}

impl LoggingMediaApi {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl MediaApi for LoggingMediaApi {
    async fn fetch_image(&self, image_ref: &ImageRef) -> Result<Vec<u8>, PublishError> {
        info!(image = %image_ref, "fetch image");
        Ok(image_ref.as_str().as_bytes().to_vec())
    }

    async fn register_upload(
        &self,
        credentials: &PublishCredentials,
    ) -> Result<UploadTarget, PublishError> {
        let n = self.next_id();
        info!(author = %credentials.author, "register upload");
        Ok(UploadTarget {
            upload_url: format!("https://upload.invalid/{n}"),
            media_handle: MediaHandle::new(format!("urn:li:image:demo-{n}")),
        })
    }

    async fn upload(
        &self,
        target: &UploadTarget,
        bytes: Vec<u8>,
        _credentials: &PublishCredentials,
    ) -> Result<(), PublishError> {
        info!(url = %target.upload_url, size = bytes.len(), "upload");
        Ok(())
    }

    async fn create_post(
        &self,
        content: &str,
        media: Option<&MediaHandle>,
        credentials: &PublishCredentials,
    ) -> Result<RemoteId, PublishError> {
        let remote_id = format!("urn:li:share:demo-{}", self.next_id());
        info!(
            author = %credentials.author,
            media = media.map(MediaHandle::as_str),
            remote_id = %remote_id,
            "create post: {content}"
        );
        Ok(remote_id)
    }
}

/// Two tenants: "acme" is fully configured, "unconfigured" has no credentials.
pub async fn seed(
    store: &InMemoryStore,
    credentials: &InMemoryCredentialStore,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) {
    let now = clock.now();

    let acme = ids.generate_tenant_id();
    store.insert_tenant(Tenant::new(acme, "acme")).await;
    credentials
        .put(
            acme,
            TenantSecrets::new()
                .with("linkedin_access_token", "demo-token")
                .with("linkedin_urn", "urn:li:organization:1001"),
        )
        .await;

    let series = ids.generate_playlist_id();
    store
        .insert_playlist(
            Playlist::new(series, acme, "Weekly tips").with_description("One tip per tick"),
        )
        .await;
    store
        .insert_channel(Channel::playlist(ids.generate_channel_id(), acme, "Tips", series))
        .await;
    for (age, content) in [(3, "Tip #1: ship small"), (2, "Tip #2: measure"), (1, "Tip #3: repeat")] {
        store
            .insert_post(
                Post::new(ids.generate_post_id(), acme, content, now - Duration::days(age))
                    .in_playlist(series)
                    .random_eligible(false),
            )
            .await;
    }

    store
        .insert_channel(Channel::random(ids.generate_channel_id(), acme, "Evergreen"))
        .await;
    for content in ["Throwback: our first office", "Meet the team", "Customer story"] {
        store
            .insert_post(Post::new(ids.generate_post_id(), acme, content, now - Duration::days(30)))
            .await;
    }

    store
        .insert_post(
            Post::new(ids.generate_post_id(), acme, "Launch day!", now - Duration::days(1))
                .with_image(ImageRef::new("https://cdn.invalid/launch.png"))
                .random_eligible(false)
                .scheduled_at(now - Duration::minutes(5)),
        )
        .await;

    let unconfigured = ids.generate_tenant_id();
    store.insert_tenant(Tenant::new(unconfigured, "unconfigured")).await;
    store
        .insert_post(
            Post::new(ids.generate_post_id(), unconfigured, "Never sent", now)
                .scheduled_at(now - Duration::minutes(1)),
        )
        .await;
}

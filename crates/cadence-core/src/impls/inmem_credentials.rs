use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{StoreError, TenantId};
use crate::ports::{CredentialStore, TenantSecrets};

/// 開発用の CredentialStore（平文でメモリに保持）
#[derive(Default)]
pub struct InMemoryCredentialStore {
    secrets: RwLock<HashMap<TenantId, TenantSecrets>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, tenant_id: TenantId, secrets: TenantSecrets) {
        self.secrets.write().await.insert(tenant_id, secrets);
    }

    pub async fn remove(&self, tenant_id: TenantId) {
        self.secrets.write().await.remove(&tenant_id);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, tenant_id: TenantId) -> Result<TenantSecrets, StoreError> {
        Ok(self
            .secrets
            .read()
            .await
            .get(&tenant_id)
            .cloned()
            .unwrap_or_default())
    }
}

//! CredentialStore port - tenant ごとの secret
//!
//! 暗号化・保存は範囲外。engine は key/value を読んで、必要な key が揃っているかだけを見る。

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ConfigurationError, StoreError, TenantId};
use crate::ports::PublishCredentials;

/// Raw key/value secrets of one tenant.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TenantSecrets(HashMap<String, String>);

impl TenantSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Value of `key`, trimmed. Blank values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for TenantSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("TenantSecrets").field("keys", &keys).finish()
    }
}

impl From<HashMap<String, String>> for TenantSecrets {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// Which secret keys make up `PublishCredentials`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialKeys {
    pub access_token: String,
    pub author: String,
}

impl Default for CredentialKeys {
    fn default() -> Self {
        Self {
            access_token: "linkedin_access_token".to_string(),
            author: "linkedin_urn".to_string(),
        }
    }
}

impl CredentialKeys {
    /// Extract publish credentials, reporting every missing key at once.
    pub fn resolve(
        &self,
        tenant_id: TenantId,
        secrets: &TenantSecrets,
    ) -> Result<PublishCredentials, ConfigurationError> {
        let access_token = secrets.get(&self.access_token);
        let author = secrets.get(&self.author);

        match (access_token, author) {
            (Some(access_token), Some(author)) => Ok(PublishCredentials {
                access_token: access_token.to_string(),
                author: author.to_string(),
            }),
            _ => {
                let mut missing = Vec::new();
                if access_token.is_none() {
                    missing.push(self.access_token.clone());
                }
                if author.is_none() {
                    missing.push(self.author.clone());
                }
                Err(ConfigurationError { tenant_id, missing })
            }
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Secrets of a tenant. An unknown tenant yields empty secrets.
    async fn get(&self, tenant_id: TenantId) -> Result<TenantSecrets, StoreError>;
}

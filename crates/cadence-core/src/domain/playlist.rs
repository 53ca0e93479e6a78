use serde::{Deserialize, Serialize};

use super::ids::{PlaylistId, TenantId};

/// Named grouping of posts. Owned by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
}

impl Playlist {
    pub fn new(id: PlaylistId, tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id,
            tenant_id,
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Isolated customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
}

impl Tenant {
    pub fn new(id: TenantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

//! Tick report - 1 回の tick の結果
//!
//! UI 側はこれを見る必要はない（失敗した post は inventory に残るだけ）が、
//! ログとテストのために tenant ごとの結果をまとめて返す。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{ExecutionError, TenantTickError};
use super::ids::{PostId, TenantId};
use super::task::TaskSource;

/// Aggregate counts for one tick, across all tenants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCounts {
    pub tenants: usize,
    pub tenants_skipped: usize,
    pub selected: usize,
    pub published: usize,
    pub failed: usize,
}

/// One successful publish-and-commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub post_id: PostId,
    pub remote_id: String,
    pub source: TaskSource,
}

/// Result of one tenant's share of a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantReport {
    pub tenant_id: TenantId,
    pub selected: usize,
    pub published: Vec<Published>,
    pub failed: Vec<ExecutionError>,
    /// Set when the tenant was skipped as a whole.
    pub skipped: Option<TenantTickError>,
}

impl TenantReport {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            selected: 0,
            published: Vec::new(),
            failed: Vec::new(),
            skipped: None,
        }
    }

    pub fn skipped(tenant_id: TenantId, reason: TenantTickError) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::new(tenant_id)
        }
    }
}

/// Result of one tick across all tenants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub tenants: Vec<TenantReport>,
}

impl TickReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            tenants: Vec::new(),
        }
    }

    pub fn counts(&self) -> TickCounts {
        let mut counts = TickCounts::default();
        for tenant in &self.tenants {
            counts.tenants += 1;
            if tenant.skipped.is_some() {
                counts.tenants_skipped += 1;
            }
            counts.selected += tenant.selected;
            counts.published += tenant.published.len();
            counts.failed += tenant.failed.len();
        }
        counts
    }

    pub fn tenant(&self, tenant_id: TenantId) -> Option<&TenantReport> {
        self.tenants.iter().find(|t| t.tenant_id == tenant_id)
    }
}

/// What happened when a tick was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(TickReport),
    /// A previous tick was still running; this one did nothing.
    Overlapped,
}

impl TickOutcome {
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Completed(report) => Some(report),
            TickOutcome::Overlapped => None,
        }
    }
}

//! Channel - 独立してスケジュールされる配信ストリーム
//!
//! # 種類
//! - **Playlist**: playlist 内で最も古い post を順番に配信
//! - **Random**: random mode 対象の inventory から 1 件を抽選
//!
//! schedule_type / scheduled_time は保存されるだけで、実際の配信タイミングは tick の周期で決まる。

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::ids::{ChannelId, PlaylistId, TenantId};

/// How a channel picks its next post.
///
/// A playlist channel carries its playlist reference, so "playlist id required
/// iff type=playlist" holds by construction. The reference is weak: the
/// playlist may have been deleted since.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelKind {
    Playlist { playlist_id: Option<PlaylistId> },
    Random,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Playlist { .. } => "playlist",
            ChannelKind::Random => "random",
        }
    }
}

/// Advisory cadence. Stored, not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid scheduled time '{0}', expected HH:mm")]
pub struct InvalidScheduledTime(pub String);

/// Advisory time of day, `HH:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScheduledTime(NaiveTime);

impl ScheduledTime {
    pub fn parse(s: &str) -> Result<Self, InvalidScheduledTime> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self)
            .map_err(|_| InvalidScheduledTime(s.to_string()))
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl Default for ScheduledTime {
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN))
    }
}

impl std::fmt::Display for ScheduledTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl TryFrom<String> for ScheduledTime {
    type Error = InvalidScheduledTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScheduledTime> for String {
    fn from(value: ScheduledTime) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub tenant_id: TenantId,
    pub name: String,
    pub kind: ChannelKind,
    pub schedule_type: ScheduleType,
    pub scheduled_time: ScheduledTime,
    pub is_active: bool,
}

impl Channel {
    /// Sequential playlist channel, active, daily at 09:00.
    pub fn playlist(
        id: ChannelId,
        tenant_id: TenantId,
        name: impl Into<String>,
        playlist_id: PlaylistId,
    ) -> Self {
        Self::with_kind(
            id,
            tenant_id,
            name,
            ChannelKind::Playlist {
                playlist_id: Some(playlist_id),
            },
        )
    }

    /// Random discovery channel, active, daily at 09:00.
    pub fn random(id: ChannelId, tenant_id: TenantId, name: impl Into<String>) -> Self {
        Self::with_kind(id, tenant_id, name, ChannelKind::Random)
    }

    fn with_kind(
        id: ChannelId,
        tenant_id: TenantId,
        name: impl Into<String>,
        kind: ChannelKind,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name: name.into(),
            kind,
            schedule_type: ScheduleType::default(),
            scheduled_time: ScheduledTime::default(),
            is_active: true,
        }
    }

    pub fn schedule(mut self, schedule_type: ScheduleType, scheduled_time: ScheduledTime) -> Self {
        self.schedule_type = schedule_type;
        self.scheduled_time = scheduled_time;
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

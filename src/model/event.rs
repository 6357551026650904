//! Playstate notifications from the remote server's event stream.

use serde::Deserialize;
use serde_json::Value;

use crate::model::media::MediaKind;
use crate::model::units::{lenient_count, lenient_millis};

/// A discrete playstate update for an already-resolved local file.
///
/// Unlike [`RemoteItem`](crate::model::RemoteItem), the event producer has
/// already mapped the remote item to its local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaystateEvent {
    pub local_file_id: i64,
    pub mark_played: bool,
    /// Last known view count, if the producer knows one.
    pub view_count: Option<i64>,
    pub resume_ms: u64,
    pub duration_ms: u64,
    /// Unix seconds, remote convention.
    pub last_played: Option<i64>,
    pub remote_type: MediaKind,
}

/// A playstate notification as read from an event feed.
///
/// `mark_played` may be omitted, in which case it is inferred from how far
/// into the item playback got.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlaystate {
    pub file_id: i64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default)]
    pub mark_played: Option<bool>,
    #[serde(default)]
    pub view_count: Value,
    #[serde(default)]
    pub view_offset: Value,
    #[serde(default)]
    pub duration: Value,
    #[serde(default)]
    pub last_viewed_at: Value,
}

impl RawPlaystate {
    /// Resolve the raw notification into an event.
    ///
    /// `mark_played_at` is the watched fraction (0.0..=1.0) at which playback
    /// counts as complete when the notification does not say so itself.
    #[must_use]
    pub fn into_event(self, mark_played_at: f64) -> PlaystateEvent {
        let resume_ms = lenient_millis(&self.view_offset);
        let duration_ms = lenient_millis(&self.duration);

        let mark_played = self
            .mark_played
            .unwrap_or_else(|| is_complete(resume_ms, duration_ms, mark_played_at));

        PlaystateEvent {
            local_file_id: self.file_id,
            mark_played,
            view_count: lenient_count(&self.view_count),
            resume_ms,
            duration_ms,
            last_played: lenient_count(&self.last_viewed_at),
            remote_type: self.kind,
        }
    }
}

/// Whether a position is far enough into an item to count as watched.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn is_complete(resume_ms: u64, duration_ms: u64, mark_played_at: f64) -> bool {
    duration_ms > 0 && resume_ms as f64 >= duration_ms as f64 * mark_played_at
}

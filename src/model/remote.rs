//! Remote item records as delivered by the media server's metadata API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::media::MediaKind;
use crate::model::units::{lenient_count, lenient_millis};

/// Watched/resume/rating state the remote server reports for one item.
///
/// Times are in the remote server's units: milliseconds for positions and
/// Unix seconds for `last_played`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserData {
    pub resume_ms: u64,
    pub runtime_ms: u64,
    /// `None` means the server did not report a count, not zero plays.
    pub play_count: Option<i64>,
    pub last_played: Option<i64>,
    pub user_rating: Option<f64>,
}

/// A remote library item, reduced to what reconciliation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteItem {
    pub remote_id: String,
    pub remote_type: MediaKind,
    pub user_data: UserData,
    /// The attributes the item arrived with, kept for diagnostics.
    pub payload: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    rating_key: Value,
    #[serde(rename = "type")]
    kind: MediaKind,
    #[serde(default)]
    view_offset: Value,
    #[serde(default)]
    duration: Value,
    #[serde(default)]
    view_count: Value,
    #[serde(default)]
    last_viewed_at: Value,
    #[serde(default)]
    user_rating: Value,
}

impl RemoteItem {
    /// Build an item from the server's JSON metadata object.
    ///
    /// The server is inconsistent about quoting numbers, so numeric
    /// attributes are accepted as numbers or numeric strings.
    ///
    /// # Errors
    ///
    /// Returns an error if `ratingKey` or `type` is missing or invalid.
    pub fn from_metadata(payload: Value) -> Result<Self> {
        let meta: Metadata = serde_json::from_value(payload.clone())?;

        let remote_id = match &meta.rating_key {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(Error::InvalidArgument(format!(
                    "ratingKey must be a string or number, got {other}"
                )));
            }
        };

        let user_data = UserData {
            resume_ms: lenient_millis(&meta.view_offset),
            runtime_ms: lenient_millis(&meta.duration),
            play_count: lenient_count(&meta.view_count),
            last_played: lenient_count(&meta.last_viewed_at),
            user_rating: lenient_rating(&meta.user_rating),
        };

        Ok(Self {
            remote_id,
            remote_type: meta.kind,
            user_data,
            payload,
        })
    }
}

fn lenient_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|r| r.is_finite())
}

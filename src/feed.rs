//! JSONL input feeds.
//!
//! Both update paths read one JSON object per line:
//! - remote items, in the remote server's metadata shape
//! - raw playstate notifications from the event stream
//!
//! Blank lines are skipped. A bad line fails the whole feed with its
//! 1-based line number, before anything is written.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{PlaystateEvent, RawPlaystate, RemoteItem};

/// Read every record of a JSONL file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - Any line cannot be parsed as a `T`
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    read_lines(path, |value| serde_json::from_value(value).map_err(|e| e.to_string()))
}

/// Read remote items, keeping each raw object as its payload.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not a valid item.
pub fn read_remote_items(path: &Path) -> Result<Vec<RemoteItem>> {
    read_lines(path, |value| RemoteItem::from_metadata(value).map_err(|e| e.to_string()))
}

/// Read raw playstate notifications and resolve them into events.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not a valid
/// notification.
pub fn read_playstates(path: &Path, mark_played_at: f64) -> Result<Vec<PlaystateEvent>> {
    let raw: Vec<RawPlaystate> = read_jsonl(path)?;
    Ok(raw
        .into_iter()
        .map(|r| r.into_event(mark_played_at))
        .collect())
}

fn read_lines<T>(
    path: &Path,
    parse: impl Fn(Value) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(Error::InvalidArgument(format!(
            "feed file not found: {}",
            path.display()
        )));
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let record = serde_json::from_str::<Value>(&line)
            .map_err(|e| e.to_string())
            .and_then(&parse)
            .map_err(|message| Error::Feed {
                line: line_num + 1,
                message,
            })?;
        records.push(record);
    }

    tracing::debug!(path = %path.display(), records = records.len(), "read feed");
    Ok(records)
}

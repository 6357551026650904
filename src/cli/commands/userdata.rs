//! Full-record userdata merge over a feed of remote items.

use crate::config::{StorePaths, SyncSettings};
use crate::error::Result;
use crate::feed;
use crate::reconcile::{MergeOutcome, ReconcileStats, ReconciliationSession, SkipReason};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SkippedItem {
    remote_id: String,
    reason: SkipReason,
}

#[derive(Serialize)]
struct UserdataOutput {
    items: usize,
    stats: ReconcileStats,
    skipped: Vec<SkippedItem>,
}

/// Execute the userdata command.
///
/// The whole feed is parsed before the session opens, so a malformed line
/// leaves the databases untouched.
///
/// # Errors
///
/// Returns an error if the feed is invalid, the databases are missing, or a
/// write or the session close fails.
pub fn execute(file: &Path, paths: &StorePaths, settings: &SyncSettings, json: bool) -> Result<()> {
    super::require_initialized(paths)?;
    let items = feed::read_remote_items(file)?;

    let (stats, skipped) = ReconciliationSession::scope(paths, settings, |session| {
        let mut skipped = Vec::new();
        for item in &items {
            if let MergeOutcome::Skipped { reason } = session.update_userdata(item)? {
                skipped.push(SkippedItem {
                    remote_id: item.remote_id.clone(),
                    reason,
                });
            }
        }
        Ok((session.stats().clone(), skipped))
    })?;

    if json {
        let output = UserdataOutput {
            items: items.len(),
            stats,
            skipped,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "{} {} of {} items",
            "Merged".green(),
            stats.merged,
            items.len()
        );
        for item in &skipped {
            let reason = match item.reason {
                SkipReason::NotSynced => "not synced locally",
                SkipReason::NoFile => "no local file",
            };
            println!("  {} {} ({reason})", "skipped".yellow(), item.remote_id);
        }
    }

    Ok(())
}

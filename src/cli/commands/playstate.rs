//! Event-stream playstate updates over a feed of notifications.

use crate::config::{StorePaths, SyncSettings};
use crate::error::Result;
use crate::feed;
use crate::reconcile::ReconciliationSession;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlaystateOutput {
    events: usize,
    completed: usize,
}

/// Execute the playstate command.
///
/// # Errors
///
/// Returns an error if the feed is invalid, the databases are missing, or a
/// write or the session close fails.
pub fn execute(file: &Path, paths: &StorePaths, settings: &SyncSettings, json: bool) -> Result<()> {
    super::require_initialized(paths)?;
    let events = feed::read_playstates(file, settings.mark_played_at)?;
    let completed = events.iter().filter(|e| e.mark_played).count();

    ReconciliationSession::scope(paths, settings, |session| {
        for event in &events {
            session.update_playstate(event)?;
        }
        Ok(())
    })?;

    if json {
        let output = PlaystateOutput {
            events: events.len(),
            completed,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} {} playstate updates", "Applied".green(), events.len());
        if completed > 0 {
            println!("  {completed} marked as watched");
        }
    }

    Ok(())
}

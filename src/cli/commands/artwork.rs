//! Artwork command: set artwork slots on a local item.

use crate::cli::ArtworkArgs;
use crate::config::{StorePaths, SyncSettings};
use crate::error::Result;
use crate::model::ArtworkBundle;
use crate::reconcile::ReconciliationSession;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct ArtworkOutput {
    kodi_id: i64,
    kodi_type: &'static str,
    requested: usize,
    written: usize,
}

/// Execute the artwork command.
///
/// Slots whose URL is unchanged are not rewritten.
///
/// # Errors
///
/// Returns an error if the databases are missing, or a write or the session
/// close fails.
pub fn execute(args: &ArtworkArgs, paths: &StorePaths, settings: &SyncSettings, json: bool) -> Result<()> {
    super::require_initialized(paths)?;

    let bundle: ArtworkBundle = args
        .slots
        .iter()
        .map(|(slot, url)| (slot.as_str(), url.as_str()))
        .collect();

    let written = ReconciliationSession::scope(paths, settings, |session| {
        session.set_fanart(&bundle, args.kodi_id, args.kind)
    })?;

    if json {
        let output = ArtworkOutput {
            kodi_id: args.kodi_id,
            kodi_type: args.kind.as_str(),
            requested: bundle.len(),
            written,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "{} {} of {} artwork slots on {} {}",
            "Updated".green(),
            written,
            bundle.len(),
            args.kind,
            args.kodi_id
        );
    }

    Ok(())
}

//! Link command: record where a remote item lives locally.
//!
//! Item creation normally writes these mappings; linking by hand covers
//! libraries populated some other way.

use crate::cli::LinkArgs;
use crate::config::{StorePaths, SyncSettings};
use crate::error::{Error, Result};
use crate::model::LocalRecord;
use crate::storage::MirrorDb;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct LinkOutput<'a> {
    remote_id: &'a str,
    remote_type: &'a str,
    local: LocalRecord,
}

/// Execute the link command.
///
/// # Errors
///
/// Returns an error if the arguments are inconsistent, the mirror is
/// missing, or the write fails.
pub fn execute(args: &LinkArgs, paths: &StorePaths, settings: &SyncSettings, json: bool) -> Result<()> {
    let record = local_record(args)?;
    super::require_initialized(paths)?;

    let mirror = MirrorDb::open(&paths.mirror, Some(settings.busy_timeout_ms))?;
    mirror.add_item(
        &args.remote_id,
        args.kind,
        &record,
        chrono::Utc::now().timestamp(),
    )?;

    if json {
        let output = LinkOutput {
            remote_id: &args.remote_id,
            remote_type: args.kind.as_str(),
            local: record,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!(
            "{} {} {} -> {} {}",
            "Linked".green(),
            args.kind,
            args.remote_id,
            record.kind,
            record.item_id
        );
        if let Some(file_id) = record.file_id {
            println!("  file: {file_id}");
        }
    }

    Ok(())
}

/// Playable items need a file; containers must not have one.
fn local_record(args: &LinkArgs) -> Result<LocalRecord> {
    match (args.kind.is_playable(), args.file_id) {
        (true, None) => Err(Error::InvalidArgument(format!(
            "a {} needs --file-id",
            args.kind
        ))),
        (false, Some(_)) => Err(Error::InvalidArgument(format!(
            "a {} has no file, drop --file-id",
            args.kind
        ))),
        (_, file_id) => Ok(LocalRecord {
            file_id,
            item_id: args.kodi_id,
            kind: args.kodi_type.unwrap_or_else(|| args.kind.kodi_kind()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KodiKind, MediaKind};

    fn args(kind: MediaKind, file_id: Option<i64>) -> LinkArgs {
        LinkArgs {
            remote_id: "5".to_string(),
            kind,
            kodi_id: 9,
            file_id,
            kodi_type: None,
        }
    }

    #[test]
    fn test_local_record_rules() {
        let movie = local_record(&args(MediaKind::Movie, Some(3))).unwrap();
        assert_eq!(movie.kind, KodiKind::Movie);
        assert_eq!(movie.file_id, Some(3));

        let show = local_record(&args(MediaKind::Show, None)).unwrap();
        assert_eq!(show.kind, KodiKind::TvShow);

        assert!(local_record(&args(MediaKind::Episode, None)).is_err());
        assert!(local_record(&args(MediaKind::Season, Some(1))).is_err());
    }
}

//! Create the local databases.
//!
//! Opening a store applies its schema, so init only has to open each
//! database once. Existing databases are never truncated: the video and
//! texture databases usually belong to the media center.

use crate::config::{StorePaths, SyncSettings};
use crate::error::{Error, Result};
use crate::storage::{StoreDomain, open_store};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    mirror: PathBuf,
    video: PathBuf,
    textures: PathBuf,
    created: Vec<&'static str>,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the databases already exist (without `force`), or a
/// directory or database cannot be created.
pub fn execute(paths: &StorePaths, settings: &SyncSettings, force: bool, json: bool) -> Result<()> {
    let missing = paths.missing();
    if missing.is_empty() && !force {
        return Err(Error::AlreadyInitialized {
            path: paths.mirror.clone(),
        });
    }

    for domain in StoreDomain::ALL {
        let path = paths.get(domain);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = open_store(domain, path, Some(settings.busy_timeout_ms))?;
        conn.close().map_err(|(_, e)| Error::Database(e))?;
    }

    let created: Vec<&'static str> = missing.iter().map(StoreDomain::as_str).collect();

    if json {
        let output = InitOutput {
            mirror: paths.mirror.clone(),
            video: paths.video.clone(),
            textures: paths.textures.clone(),
            created,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", "Initialized mediasync databases".green());
        for domain in StoreDomain::ALL {
            let marker = if missing.contains(&domain) { "created" } else { "existing" };
            println!(
                "  {:<9} {} {}",
                domain.as_str(),
                paths.get(domain).display(),
                format!("({marker})").dimmed()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_then_refuses() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths::in_dir(&dir.path().join("nested"));
        let settings = SyncSettings::default();

        execute(&paths, &settings, false, true).unwrap();
        assert!(paths.missing().is_empty());

        let err = execute(&paths, &settings, false, true).unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized { .. }));

        // Force re-applies schemas without losing data
        crate::storage::MirrorDb::open(&paths.mirror, None)
            .unwrap()
            .add_item(
                "1",
                crate::model::MediaKind::Movie,
                &crate::model::LocalRecord {
                    file_id: Some(1),
                    item_id: 1,
                    kind: crate::model::KodiKind::Movie,
                },
                0,
            )
            .unwrap();
        execute(&paths, &settings, true, true).unwrap();
        let mirror = crate::storage::MirrorDb::open(&paths.mirror, None).unwrap();
        assert_eq!(mirror.count_items().unwrap(), 1);
    }
}

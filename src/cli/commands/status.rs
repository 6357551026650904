//! Status command implementation.

use crate::config::{StorePaths, SyncSettings};
use crate::error::Result;
use crate::storage::{MirrorDb, VideoDb};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    mirror: MirrorStatus,
    video: VideoStatus,
}

#[derive(Serialize)]
struct MirrorStatus {
    path: PathBuf,
    linked_items: usize,
}

#[derive(Serialize)]
struct VideoStatus {
    path: PathBuf,
    texture_path: PathBuf,
    files: usize,
    watched: usize,
    resume_points: usize,
    artwork: usize,
}

/// Execute status command.
///
/// # Errors
///
/// Returns an error if the databases are missing or cannot be queried.
pub fn execute(paths: &StorePaths, settings: &SyncSettings, json: bool) -> Result<()> {
    super::require_initialized(paths)?;

    let timeout = Some(settings.busy_timeout_ms);
    let mirror = MirrorDb::open(&paths.mirror, timeout)?;
    let video = VideoDb::open(&paths.video, &paths.textures, timeout)?;

    let linked_items = mirror.count_items()?;
    let (files, watched, resume_points, artwork) = video.counts()?;

    if json {
        let output = StatusOutput {
            mirror: MirrorStatus {
                path: paths.mirror.clone(),
                linked_items,
            },
            video: VideoStatus {
                path: paths.video.clone(),
                texture_path: paths.textures.clone(),
                files,
                watched,
                resume_points,
                artwork,
            },
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", "Mediasync Status".bold());
        println!("================");
        println!();
        println!("Mirror: {}", paths.mirror.display());
        println!("  Linked items:  {linked_items}");
        println!();
        println!("Video:  {}", paths.video.display());
        println!("  Files:         {files}");
        println!("  Watched:       {watched}");
        println!("  Resume points: {resume_points}");
        println!("  Artwork:       {artwork}");
    }

    Ok(())
}

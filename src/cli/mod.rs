//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DEFAULT_MARK_PLAYED_AT, StoreOverrides, StorePaths, SyncSettings};
use crate::error::Result;
use crate::model::{KodiKind, MediaKind};
use crate::storage::DEFAULT_BUSY_TIMEOUT_MS;

pub mod commands;

/// Mediasync - reconcile remote playstate into a local media library
#[derive(Parser, Debug)]
#[command(name = "mediasync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: ~/.mediasync/data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Mirror database path (default: <data-dir>/mirror.db)
    #[arg(long, global = true)]
    pub mirror_db: Option<PathBuf>,

    /// Video library database path (default: <data-dir>/MyVideos.db)
    #[arg(long, global = true)]
    pub video_db: Option<PathBuf>,

    /// Texture cache database path (default: <data-dir>/Textures.db)
    #[arg(long, global = true)]
    pub texture_db: Option<PathBuf>,

    /// Milliseconds to wait on a locked database
    #[arg(long, global = true, env = "MEDIASYNC_BUSY_TIMEOUT_MS", default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    pub busy_timeout: u64,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    /// Resolve database locations from flags, environment and defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined.
    pub fn store_paths(&self) -> Result<StorePaths> {
        let overrides = StoreOverrides {
            mirror: self.mirror_db.clone(),
            video: self.video_db.clone(),
            textures: self.texture_db.clone(),
        };
        StorePaths::resolve(self.data_dir.as_deref(), &overrides)
    }

    /// Settings for a reconciliation run.
    ///
    /// # Errors
    ///
    /// Returns an error if `mark_played_at` is out of range.
    pub fn sync_settings(&self, mark_played_at: f64) -> Result<SyncSettings> {
        SyncSettings::new(self.busy_timeout, mark_played_at)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the mirror, video and texture databases
    Init {
        /// Re-apply schemas even if the databases already exist
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show what the databases hold
    Status,

    /// Merge full remote user data from a JSONL feed of remote items
    Userdata {
        /// JSONL file, one remote metadata object per line
        file: PathBuf,
    },

    /// Apply playstate notifications from a JSONL event feed
    Playstate(PlaystateArgs),

    /// Map a remote item to its local record
    Link(LinkArgs),

    /// Set artwork on a local item
    Artwork(ArtworkArgs),

    /// Split a play URL into its path and top-level path
    SplitPath {
        /// Play URL or file-system path
        url: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
pub struct PlaystateArgs {
    /// JSONL file, one notification per line
    pub file: PathBuf,

    /// Watched fraction at which playback counts as complete
    #[arg(long, env = "MEDIASYNC_MARK_PLAYED_AT", default_value_t = DEFAULT_MARK_PLAYED_AT)]
    pub mark_played_at: f64,
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Remote item id (ratingKey)
    pub remote_id: String,

    /// Remote item type
    #[arg(short = 't', long = "type", value_parser = parse_media_kind)]
    pub kind: MediaKind,

    /// Local item id
    #[arg(long)]
    pub kodi_id: i64,

    /// Local file id (movies and episodes only)
    #[arg(long)]
    pub file_id: Option<i64>,

    /// Local item type (default: derived from the remote type)
    #[arg(long, value_parser = parse_kodi_kind)]
    pub kodi_type: Option<KodiKind>,
}

#[derive(Args, Debug)]
pub struct ArtworkArgs {
    /// Local item id
    pub kodi_id: i64,

    /// Local item type
    #[arg(short = 't', long = "type", value_parser = parse_kodi_kind)]
    pub kind: KodiKind,

    /// Artwork slot and URL, e.g. poster=http://host/p.jpg (repeatable)
    #[arg(long = "set", value_parser = parse_slot, required = true)]
    pub slots: Vec<(String, String)>,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

fn parse_media_kind(s: &str) -> std::result::Result<MediaKind, String> {
    s.parse()
}

fn parse_kodi_kind(s: &str) -> std::result::Result<KodiKind, String> {
    s.parse()
}

fn parse_slot(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((slot, url)) if !slot.trim().is_empty() && !url.trim().is_empty() => {
            Ok((slot.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(format!("expected SLOT=URL, got '{s}'")),
    }
}

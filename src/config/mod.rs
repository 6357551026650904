//! Configuration management.
//!
//! This module resolves where the three databases live and the tunables of a
//! reconciliation run.
//!
//! # Layout
//!
//! By default every database lives in one data directory,
//! `~/.mediasync/data/`:
//! - `mirror.db` - identity index written by the sync workflow
//! - `MyVideos.db` - the media center's video library
//! - `Textures.db` - the media center's thumbnail cache
//!
//! The media-center databases usually live elsewhere (inside the media
//! center's own profile), so each path can be overridden on its own.

use crate::error::{Error, Result};
use crate::storage::{DEFAULT_BUSY_TIMEOUT_MS, StoreDomain};

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MEDIASYNC_DATA_DIR";
/// Environment variable overriding the mirror database path.
pub const MIRROR_DB_ENV: &str = "MEDIASYNC_MIRROR_DB";
/// Environment variable overriding the video database path.
pub const VIDEO_DB_ENV: &str = "MEDIASYNC_VIDEO_DB";
/// Environment variable overriding the texture database path.
pub const TEXTURE_DB_ENV: &str = "MEDIASYNC_TEXTURE_DB";

const MIRROR_DB_FILE: &str = "mirror.db";
const VIDEO_DB_FILE: &str = "MyVideos.db";
const TEXTURE_DB_FILE: &str = "Textures.db";

/// Default watched fraction at which playback counts as complete.
pub const DEFAULT_MARK_PLAYED_AT: f64 = 0.9;

/// Get the global Mediasync directory location (`~/.mediasync/`).
#[must_use]
pub fn global_mediasync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".mediasync"))
}

/// Resolve the data directory.
///
/// Priority:
/// 1. If `explicit` is provided, use it directly
/// 2. `MEDIASYNC_DATA_DIR` environment variable
/// 3. Global location: `~/.mediasync/data`
///
/// Returns `None` only when no home directory can be determined.
#[must_use]
pub fn resolve_data_dir(explicit: Option<&Path>) -> Option<PathBuf> {
    resolve_data_dir_with(explicit, env_var)
}

fn resolve_data_dir_with(
    explicit: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    // Priority 1: Explicit path from CLI flag
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(dir) = env(DATA_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }

    // Priority 3: Global location
    global_mediasync_dir().map(|dir| dir.join("data"))
}

/// Non-empty value of an environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Per-database path overrides (from CLI flags).
#[derive(Debug, Clone, Default)]
pub struct StoreOverrides {
    pub mirror: Option<PathBuf>,
    pub video: Option<PathBuf>,
    pub textures: Option<PathBuf>,
}

/// Resolved locations of the three databases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub mirror: PathBuf,
    pub video: PathBuf,
    pub textures: PathBuf,
}

impl StorePaths {
    /// Default file names inside one directory.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            mirror: dir.join(MIRROR_DB_FILE),
            video: dir.join(VIDEO_DB_FILE),
            textures: dir.join(TEXTURE_DB_FILE),
        }
    }

    /// Resolve every path: flag override, then environment, then data dir.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no data directory can be determined.
    pub fn resolve(data_dir: Option<&Path>, overrides: &StoreOverrides) -> Result<Self> {
        Self::resolve_with(data_dir, overrides, env_var)
    }

    fn resolve_with(
        data_dir: Option<&Path>,
        overrides: &StoreOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let dir = resolve_data_dir_with(data_dir, &env)
            .ok_or_else(|| Error::Config("could not determine home directory".to_string()))?;
        let defaults = Self::in_dir(&dir);

        let pick = |flag: &Option<PathBuf>, var: &str, default: PathBuf| {
            flag.clone()
                .or_else(|| env(var).map(PathBuf::from))
                .unwrap_or(default)
        };

        Ok(Self {
            mirror: pick(&overrides.mirror, MIRROR_DB_ENV, defaults.mirror),
            video: pick(&overrides.video, VIDEO_DB_ENV, defaults.video),
            textures: pick(&overrides.textures, TEXTURE_DB_ENV, defaults.textures),
        })
    }

    /// Path of one domain's database.
    #[must_use]
    pub fn get(&self, domain: StoreDomain) -> &Path {
        match domain {
            StoreDomain::Mirror => &self.mirror,
            StoreDomain::Video => &self.video,
            StoreDomain::Textures => &self.textures,
        }
    }

    /// Domains whose database file does not exist yet.
    #[must_use]
    pub fn missing(&self) -> Vec<StoreDomain> {
        StoreDomain::ALL
            .into_iter()
            .filter(|domain| !self.get(*domain).exists())
            .collect()
    }
}

/// Tunables of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    /// How long a connection waits on a locked database.
    pub busy_timeout_ms: u64,
    /// Watched fraction (0.0..=1.0) at which playback counts as complete.
    pub mark_played_at: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            mark_played_at: DEFAULT_MARK_PLAYED_AT,
        }
    }
}

impl SyncSettings {
    /// Build validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `mark_played_at` is outside `(0.0, 1.0]`.
    pub fn new(busy_timeout_ms: u64, mark_played_at: f64) -> Result<Self> {
        if !(mark_played_at > 0.0 && mark_played_at <= 1.0) {
            return Err(Error::Config(format!(
                "mark-played threshold must be in (0, 1], got {mark_played_at}"
            )));
        }
        Ok(Self {
            busy_timeout_ms,
            mark_played_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_resolve_data_dir_with_explicit() {
        let explicit = PathBuf::from("/custom/data");
        let env = env_from(&[(DATA_DIR_ENV, "/from/env")]);
        assert_eq!(
            resolve_data_dir_with(Some(explicit.as_path()), env),
            Some(explicit)
        );
    }

    #[test]
    fn test_resolve_data_dir_env_then_global() {
        let env = env_from(&[(DATA_DIR_ENV, "/from/env")]);
        assert_eq!(
            resolve_data_dir_with(None, env),
            Some(PathBuf::from("/from/env"))
        );

        let global = resolve_data_dir_with(None, env_from(&[])).unwrap();
        assert!(global.ends_with(".mediasync/data"));
    }

    #[test]
    fn test_store_paths_defaults_in_dir() {
        let paths = StorePaths::in_dir(Path::new("/d"));
        assert_eq!(paths.mirror, PathBuf::from("/d/mirror.db"));
        assert_eq!(paths.get(StoreDomain::Video), Path::new("/d/MyVideos.db"));
        assert_eq!(paths.get(StoreDomain::Textures), Path::new("/d/Textures.db"));
    }

    #[test]
    fn test_store_paths_override_priority() {
        let overrides = StoreOverrides {
            video: Some(PathBuf::from("/flag/video.db")),
            ..StoreOverrides::default()
        };
        let env = env_from(&[
            (VIDEO_DB_ENV, "/env/video.db"),
            (TEXTURE_DB_ENV, "/env/tex.db"),
        ]);

        let paths = StorePaths::resolve_with(Some(Path::new("/d")), &overrides, env).unwrap();
        assert_eq!(paths.mirror, PathBuf::from("/d/mirror.db"));
        assert_eq!(paths.video, PathBuf::from("/flag/video.db"));
        assert_eq!(paths.textures, PathBuf::from("/env/tex.db"));
    }

    #[test]
    fn test_missing_reports_absent_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths::in_dir(dir.path());
        assert_eq!(paths.missing(), StoreDomain::ALL.to_vec());

        std::fs::write(&paths.mirror, b"").unwrap();
        assert_eq!(
            paths.missing(),
            vec![StoreDomain::Video, StoreDomain::Textures]
        );
    }

    #[test]
    fn test_sync_settings_validation() {
        assert_eq!(SyncSettings::default().mark_played_at, 0.9);
        assert!(SyncSettings::new(1000, 1.0).is_ok());
        assert!(SyncSettings::new(1000, 0.0).is_err());
        assert!(SyncSettings::new(1000, 1.5).is_err());
        assert!(SyncSettings::new(1000, f64::NAN).is_err());
    }
}

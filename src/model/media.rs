//! Media kinds on both sides of the mirror and the identity mapping between them.

use serde::{Deserialize, Serialize};

/// Item type as reported by the remote media server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Show,
    Season,
    Episode,
}

impl MediaKind {
    /// Storage string, also the remote server's own spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
            Self::Season => "season",
            Self::Episode => "episode",
        }
    }

    /// The local media-center type this remote type is mirrored as.
    #[must_use]
    pub const fn kodi_kind(&self) -> KodiKind {
        match self {
            Self::Movie => KodiKind::Movie,
            Self::Show => KodiKind::TvShow,
            Self::Season => KodiKind::Season,
            Self::Episode => KodiKind::Episode,
        }
    }

    /// Whether items of this kind have a playable file (and thus playstate).
    #[must_use]
    pub const fn is_playable(&self) -> bool {
        matches!(self, Self::Movie | Self::Episode)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "show" => Ok(Self::Show),
            "season" => Ok(Self::Season),
            "episode" => Ok(Self::Episode),
            _ => Err(format!("Unknown media type: {s}")),
        }
    }
}

/// Item type in the local media-center database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KodiKind {
    Movie,
    #[serde(rename = "tvshow")]
    TvShow,
    Season,
    Episode,
}

impl KodiKind {
    /// The `media_type` string used by the art table and the mirror index.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::TvShow => "tvshow",
            Self::Season => "season",
            Self::Episode => "episode",
        }
    }

    /// Table and primary key column holding rows of this kind.
    #[must_use]
    pub const fn table(&self) -> (&'static str, &'static str) {
        match self {
            Self::Movie => ("movie", "idMovie"),
            Self::TvShow => ("tvshow", "idShow"),
            Self::Season => ("seasons", "idSeason"),
            Self::Episode => ("episode", "idEpisode"),
        }
    }
}

impl std::fmt::Display for KodiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KodiKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "tvshow" => Ok(Self::TvShow),
            "season" => Ok(Self::Season),
            "episode" => Ok(Self::Episode),
            _ => Err(format!("Unknown local media type: {s}")),
        }
    }
}

/// Where a synced remote item lives in the local database.
///
/// Created by the item-creation workflow, only ever looked up during
/// reconciliation. Containers (shows, seasons) have no file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalRecord {
    pub file_id: Option<i64>,
    pub item_id: i64,
    pub kind: KodiKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_parse_and_display() {
        for kind in [
            MediaKind::Movie,
            MediaKind::Show,
            MediaKind::Season,
            MediaKind::Episode,
        ] {
            assert_eq!(kind.to_string().parse::<MediaKind>().unwrap(), kind);
        }
        assert!("album".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_show_maps_to_tvshow() {
        assert_eq!(MediaKind::Show.kodi_kind(), KodiKind::TvShow);
        assert_eq!(KodiKind::TvShow.as_str(), "tvshow");
        assert_eq!(KodiKind::TvShow.table(), ("tvshow", "idShow"));
    }

    #[test]
    fn test_only_movies_and_episodes_are_playable() {
        assert!(MediaKind::Movie.is_playable());
        assert!(MediaKind::Episode.is_playable());
        assert!(!MediaKind::Show.is_playable());
        assert!(!MediaKind::Season.is_playable());
    }
}

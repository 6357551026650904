//! Database schema definitions for the three storage domains.
//!
//! The video and texture schemas are the subset of the media center's own
//! layout that reconciliation reads and writes. Column names follow the
//! media center so the same statements work against a real library.

use rusqlite::{Connection, Result};

use super::StoreDomain;

/// Identity index: one row per synced remote item.
pub const MIRROR_SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS items (
    remote_id TEXT NOT NULL,
    remote_type TEXT NOT NULL,
    kodi_id INTEGER NOT NULL,
    kodi_fileid INTEGER,
    kodi_type TEXT NOT NULL,
    last_sync INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (remote_id, remote_type)
);

CREATE INDEX IF NOT EXISTS idx_items_kodi ON items(kodi_id, kodi_type);
";

/// Local video library (files, resume bookmarks, ratings, artwork).
///
/// Timestamps are stored as local wall-clock TEXT, positions as REAL seconds.
pub const VIDEO_SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS files (
    idFile INTEGER PRIMARY KEY,
    idPath INTEGER,
    strFilename TEXT,
    playCount INTEGER,
    lastPlayed TEXT,
    dateAdded TEXT
);

CREATE TABLE IF NOT EXISTS bookmark (
    idBookmark INTEGER PRIMARY KEY,
    idFile INTEGER NOT NULL,
    timeInSeconds REAL,
    totalTimeInSeconds REAL,
    thumbNailImage TEXT,
    player TEXT,
    playerState TEXT,
    type INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS ix_bookmark ON bookmark(idFile, type);

CREATE TABLE IF NOT EXISTS movie (
    idMovie INTEGER PRIMARY KEY,
    idFile INTEGER,
    c00 TEXT,
    userrating INTEGER
);

CREATE TABLE IF NOT EXISTS tvshow (
    idShow INTEGER PRIMARY KEY,
    c00 TEXT,
    userrating INTEGER
);

CREATE TABLE IF NOT EXISTS seasons (
    idSeason INTEGER PRIMARY KEY,
    idShow INTEGER,
    season INTEGER,
    userrating INTEGER
);

CREATE TABLE IF NOT EXISTS episode (
    idEpisode INTEGER PRIMARY KEY,
    idFile INTEGER,
    c00 TEXT,
    idShow INTEGER,
    idSeason INTEGER,
    userrating INTEGER
);

CREATE TABLE IF NOT EXISTS art (
    art_id INTEGER PRIMARY KEY,
    media_id INTEGER NOT NULL,
    media_type TEXT NOT NULL,
    type TEXT NOT NULL,
    url TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS ix_art ON art(media_id, media_type, type);
";

/// Thumbnail cache: cached copies of artwork URLs.
pub const TEXTURE_SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS texture (
    id INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    cachedurl TEXT,
    imagehash TEXT,
    lasthashcheck TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idxTexture ON texture(url);

CREATE TABLE IF NOT EXISTS sizes (
    idtexture INTEGER NOT NULL,
    size INTEGER,
    width INTEGER,
    height INTEGER,
    usecount INTEGER,
    lastusetime TEXT
);

CREATE INDEX IF NOT EXISTS idxSize ON sizes(idtexture, size);
";

/// The DDL script for a domain.
#[must_use]
pub const fn schema_sql(domain: StoreDomain) -> &'static str {
    match domain {
        StoreDomain::Mirror => MIRROR_SCHEMA_SQL,
        StoreDomain::Video => VIDEO_SCHEMA_SQL,
        StoreDomain::Textures => TEXTURE_SCHEMA_SQL,
    }
}

/// Apply connection pragmas and the domain schema.
///
/// Idempotent: all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection, domain: StoreDomain) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(schema_sql(domain))
}

//! Local video library writer: playstate, user ratings and artwork.
//!
//! Artwork lives in the video database, but its cached thumbnails live in
//! the texture database, so the writer holds both connections.

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::model::units::{format_local_date, to_local_seconds};
use crate::model::{ArtworkBundle, KodiKind, MediaKind};
use crate::storage::{StoreDomain, open_store, open_store_in_memory};

/// Bookmark type of a resume point (other types are chapters, episodes).
const RESUME_BOOKMARK: i64 = 1;

/// Player recorded on resume bookmarks.
const VIDEO_PLAYER: &str = "VideoPlayer";

/// Playstate of one local file, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePlaystate {
    pub play_count: Option<i64>,
    pub last_played: Option<String>,
    /// Resume position and total time in seconds, if a resume point exists.
    pub resume: Option<(f64, f64)>,
}

/// Writer over the local video and texture databases.
#[derive(Debug)]
pub struct VideoDb {
    video: Connection,
    textures: Connection,
}

impl VideoDb {
    /// Wrap already configured connections.
    #[must_use]
    pub fn new(video: Connection, textures: Connection) -> Self {
        Self { video, textures }
    }

    /// Open the video and texture databases.
    ///
    /// # Errors
    ///
    /// Returns an error if either connection cannot be established.
    pub fn open(video_path: &Path, texture_path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let video = open_store(StoreDomain::Video, video_path, timeout_ms)?;
        let textures = open_store(StoreDomain::Textures, texture_path, timeout_ms)?;
        Ok(Self::new(video, textures))
    }

    /// Open in-memory databases (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connections cannot be established.
    pub fn open_memory() -> Result<Self> {
        Ok(Self::new(
            open_store_in_memory(StoreDomain::Video)?,
            open_store_in_memory(StoreDomain::Textures)?,
        ))
    }

    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.video
    }

    #[must_use]
    pub fn texture_conn(&self) -> &Connection {
        &self.textures
    }

    /// Give up the wrapper and return `(video, textures)`.
    #[must_use]
    pub fn into_connections(self) -> (Connection, Connection) {
        (self.video, self.textures)
    }

    // ==================
    // Playstate
    // ==================

    /// Store the watched state and resume point of a file.
    ///
    /// An absent `play_count` is stored as NULL (never seen), which the media
    /// center distinguishes from an explicit 0. A zero `resume` clears the
    /// resume point.
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub fn set_resume(
        &self,
        file_id: i64,
        resume: Duration,
        runtime: Duration,
        play_count: Option<i64>,
        last_played: Option<NaiveDateTime>,
        kind: MediaKind,
    ) -> Result<()> {
        let last_played = last_played.as_ref().map(format_local_date);
        let updated = self.video.execute(
            "UPDATE files SET playCount = ?1, lastPlayed = ?2 WHERE idFile = ?3",
            rusqlite::params![play_count, last_played, file_id],
        )?;
        if updated == 0 {
            tracing::warn!(file_id, %kind, "no local file row to record playstate on");
            return Ok(());
        }

        self.video.execute(
            "DELETE FROM bookmark WHERE idFile = ?1 AND type = ?2",
            rusqlite::params![file_id, RESUME_BOOKMARK],
        )?;
        if !resume.is_zero() {
            self.video.execute(
                "INSERT INTO bookmark (idFile, timeInSeconds, totalTimeInSeconds, thumbNailImage, player, playerState, type)
                 VALUES (?1, ?2, ?3, '', ?4, '', ?5)",
                rusqlite::params![
                    file_id,
                    to_local_seconds(resume),
                    to_local_seconds(runtime),
                    VIDEO_PLAYER,
                    RESUME_BOOKMARK,
                ],
            )?;
        }

        tracing::debug!(file_id, %kind, ?play_count, resume_secs = resume.as_secs(), "set resume");
        Ok(())
    }

    /// Read back the stored playstate of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn playstate(&self, file_id: i64) -> Result<Option<FilePlaystate>> {
        let file = self
            .video
            .query_row(
                "SELECT playCount, lastPlayed FROM files WHERE idFile = ?1",
                [file_id],
                |row| Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        let Some((play_count, last_played)) = file else {
            return Ok(None);
        };

        let resume = self
            .video
            .query_row(
                "SELECT timeInSeconds, totalTimeInSeconds FROM bookmark
                 WHERE idFile = ?1 AND type = ?2",
                rusqlite::params![file_id, RESUME_BOOKMARK],
                |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
            )
            .optional()?;

        Ok(Some(FilePlaystate {
            play_count,
            last_played,
            resume,
        }))
    }

    // ==================
    // Ratings
    // ==================

    /// Store the user's rating of an item.
    ///
    /// The media center keeps whole-number ratings from 0 to 10, so the value
    /// is truncated and clamped. An absent rating clears it.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_user_rating(&self, item_id: i64, kind: KodiKind, rating: Option<f64>) -> Result<()> {
        let stored = rating.map(local_rating);
        let (table, id_column) = kind.table();
        let sql = format!("UPDATE {table} SET userrating = ?1 WHERE {id_column} = ?2");
        let updated = self.video.execute(&sql, rusqlite::params![stored, item_id])?;
        if updated == 0 {
            tracing::warn!(item_id, %kind, "no local item row to rate");
        }
        Ok(())
    }

    /// Read back the stored user rating of an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn user_rating(&self, item_id: i64, kind: KodiKind) -> Result<Option<i64>> {
        let (table, id_column) = kind.table();
        let sql = format!("SELECT userrating FROM {table} WHERE {id_column} = ?1");
        let rating = self
            .video
            .query_row(&sql, [item_id], |row| row.get::<_, Option<i64>>(0))
            .optional()?;
        Ok(rating.flatten())
    }

    // ==================
    // Artwork
    // ==================

    /// Apply the slots present in `artwork` to an item.
    ///
    /// Slots absent from the bundle are left alone. When a slot's URL
    /// changes, the cached texture of the old URL is dropped so the media
    /// center fetches the new image. Returns the number of slots written.
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub fn modify_artwork(&self, artwork: &ArtworkBundle, item_id: i64, kind: KodiKind) -> Result<usize> {
        let mut written = 0;
        for (slot, url) in artwork.iter() {
            let current: Option<String> = self
                .video
                .query_row(
                    "SELECT url FROM art WHERE media_id = ?1 AND media_type = ?2 AND type = ?3",
                    rusqlite::params![item_id, kind.as_str(), slot],
                    |row| row.get(0),
                )
                .optional()?;

            match current {
                Some(old) if old == url => continue,
                Some(old) => {
                    tracing::debug!(item_id, %kind, slot, %old, new = url, "replacing artwork");
                    self.video.execute(
                        "UPDATE art SET url = ?1 WHERE media_id = ?2 AND media_type = ?3 AND type = ?4",
                        rusqlite::params![url, item_id, kind.as_str(), slot],
                    )?;
                    self.delete_cached_texture(&old)?;
                }
                None => {
                    self.video.execute(
                        "INSERT INTO art (media_id, media_type, type, url) VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![item_id, kind.as_str(), slot, url],
                    )?;
                }
            }
            written += 1;
        }
        Ok(written)
    }

    /// Read back every stored art slot of an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn artwork(&self, item_id: i64, kind: KodiKind) -> Result<ArtworkBundle> {
        let mut stmt = self.video.prepare(
            "SELECT type, url FROM art WHERE media_id = ?1 AND media_type = ?2 ORDER BY type",
        )?;
        let rows = stmt.query_map(rusqlite::params![item_id, kind.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut bundle = ArtworkBundle::new();
        for row in rows {
            let (slot, url) = row?;
            bundle.set(&slot, &url);
        }
        Ok(bundle)
    }

    fn delete_cached_texture(&self, url: &str) -> Result<()> {
        self.textures.execute(
            "DELETE FROM sizes WHERE idtexture IN (SELECT id FROM texture WHERE url = ?1)",
            [url],
        )?;
        self.textures
            .execute("DELETE FROM texture WHERE url = ?1", [url])?;
        Ok(())
    }

    // ==================
    // Statistics
    // ==================

    /// Counts of `(files, watched files, resume points, art rows)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn counts(&self) -> Result<(usize, usize, usize, usize)> {
        let (files, watched, resumes, art): (i64, i64, i64, i64) = self.video.query_row(
            "SELECT
                (SELECT COUNT(*) FROM files),
                (SELECT COUNT(*) FROM files WHERE playCount > 0),
                (SELECT COUNT(*) FROM bookmark WHERE type = 1),
                (SELECT COUNT(*) FROM art)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;
        let n = |v: i64| usize::try_from(v).unwrap_or(0);
        Ok((n(files), n(watched), n(resumes), n(art)))
    }
}

/// A remote rating in the local store's integer 0..=10 scale.
#[allow(clippy::cast_possible_truncation)]
fn local_rating(rating: f64) -> i64 {
    rating.clamp(0.0, 10.0).trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::units::remote_epoch_to_local;

    fn seeded() -> VideoDb {
        let db = VideoDb::open_memory().unwrap();
        db.conn()
            .execute_batch(
                "INSERT INTO files (idFile, strFilename) VALUES (55, 'heat.mkv');
                 INSERT INTO movie (idMovie, idFile, c00) VALUES (77, 55, 'Heat');
                 INSERT INTO tvshow (idShow, c00) VALUES (8, 'Show');",
            )
            .unwrap();
        db
    }

    #[test]
    fn test_set_resume_stores_seconds_and_count() {
        let db = seeded();
        let played = remote_epoch_to_local(1_700_000_000);
        db.set_resume(
            55,
            Duration::from_secs(300),
            Duration::from_secs(7200),
            Some(2),
            played,
            MediaKind::Movie,
        )
        .unwrap();

        let state = db.playstate(55).unwrap().unwrap();
        assert_eq!(state.play_count, Some(2));
        assert_eq!(state.last_played, played.as_ref().map(format_local_date));
        assert_eq!(state.resume, Some((300.0, 7200.0)));
    }

    #[test]
    fn test_absent_count_is_null_and_zero_is_zero() {
        let db = seeded();
        db.set_resume(55, Duration::ZERO, Duration::ZERO, None, None, MediaKind::Movie)
            .unwrap();
        assert_eq!(db.playstate(55).unwrap().unwrap().play_count, None);

        db.set_resume(55, Duration::ZERO, Duration::ZERO, Some(0), None, MediaKind::Movie)
            .unwrap();
        assert_eq!(db.playstate(55).unwrap().unwrap().play_count, Some(0));
    }

    #[test]
    fn test_zero_resume_clears_bookmark() {
        let db = seeded();
        db.set_resume(55, Duration::from_secs(60), Duration::from_secs(100), None, None, MediaKind::Movie)
            .unwrap();
        db.set_resume(55, Duration::ZERO, Duration::from_secs(100), Some(1), None, MediaKind::Movie)
            .unwrap();

        let state = db.playstate(55).unwrap().unwrap();
        assert_eq!(state.resume, None);
        assert_eq!(state.play_count, Some(1));
    }

    #[test]
    fn test_set_resume_is_idempotent() {
        let db = seeded();
        let apply = || {
            db.set_resume(55, Duration::from_secs(42), Duration::from_secs(90), Some(3), None, MediaKind::Movie)
                .unwrap();
        };
        apply();
        let first = db.playstate(55).unwrap();
        let bookmark_id: i64 = db
            .conn()
            .query_row("SELECT idBookmark FROM bookmark WHERE idFile = 55", [], |r| r.get(0))
            .unwrap();
        apply();
        assert_eq!(db.playstate(55).unwrap(), first);
        let again: i64 = db
            .conn()
            .query_row("SELECT idBookmark FROM bookmark WHERE idFile = 55", [], |r| r.get(0))
            .unwrap();
        assert_eq!(bookmark_id, again);
    }

    #[test]
    fn test_missing_file_row_is_not_created() {
        let db = seeded();
        db.set_resume(999, Duration::from_secs(5), Duration::from_secs(10), Some(1), None, MediaKind::Movie)
            .unwrap();
        assert_eq!(db.playstate(999).unwrap(), None);
        assert_eq!(db.counts().unwrap().2, 0);
    }

    #[test]
    fn test_user_rating_truncates_and_clears() {
        let db = seeded();
        db.update_user_rating(77, KodiKind::Movie, Some(8.5)).unwrap();
        assert_eq!(db.user_rating(77, KodiKind::Movie).unwrap(), Some(8));

        db.update_user_rating(8, KodiKind::TvShow, Some(12.0)).unwrap();
        assert_eq!(db.user_rating(8, KodiKind::TvShow).unwrap(), Some(10));

        db.update_user_rating(77, KodiKind::Movie, None).unwrap();
        assert_eq!(db.user_rating(77, KodiKind::Movie).unwrap(), None);
    }

    #[test]
    fn test_modify_artwork_partial_and_idempotent() {
        let db = seeded();
        let initial = ArtworkBundle::new()
            .with("poster", "http://srv/poster1.jpg")
            .with("fanart", "http://srv/fanart1.jpg");
        assert_eq!(db.modify_artwork(&initial, 77, KodiKind::Movie).unwrap(), 2);

        // Bundle without a poster leaves the stored poster untouched
        let update = ArtworkBundle::new().with("fanart", "http://srv/fanart2.jpg");
        assert_eq!(db.modify_artwork(&update, 77, KodiKind::Movie).unwrap(), 1);
        let once = db.artwork(77, KodiKind::Movie).unwrap();
        assert_eq!(once.get("poster"), Some("http://srv/poster1.jpg"));
        assert_eq!(once.get("fanart"), Some("http://srv/fanart2.jpg"));

        // Second application changes nothing
        assert_eq!(db.modify_artwork(&update, 77, KodiKind::Movie).unwrap(), 0);
        assert_eq!(db.artwork(77, KodiKind::Movie).unwrap(), once);
    }

    #[test]
    fn test_replaced_artwork_drops_cached_texture() {
        let db = seeded();
        db.modify_artwork(&ArtworkBundle::new().with("poster", "old.jpg"), 77, KodiKind::Movie)
            .unwrap();
        db.texture_conn()
            .execute_batch(
                "INSERT INTO texture (id, url, cachedurl) VALUES (1, 'old.jpg', 'a/b.jpg');
                 INSERT INTO sizes (idtexture, size) VALUES (1, 1);
                 INSERT INTO texture (id, url, cachedurl) VALUES (2, 'other.jpg', 'c/d.jpg');",
            )
            .unwrap();

        db.modify_artwork(&ArtworkBundle::new().with("poster", "new.jpg"), 77, KodiKind::Movie)
            .unwrap();

        let remaining: Vec<String> = db
            .texture_conn()
            .prepare("SELECT url FROM texture ORDER BY url")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(remaining, vec!["other.jpg"]);
        let sizes: i64 = db
            .texture_conn()
            .query_row("SELECT COUNT(*) FROM sizes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(sizes, 0);
    }
}

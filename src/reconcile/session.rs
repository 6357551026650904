//! Reconciliation session: scoped ownership of the store connections.
//!
//! A session opens the mirror, video and texture databases, runs every
//! update inside one transaction per connection, and on exit commits,
//! checkpoints and closes all of them. Exit always runs every step on every
//! connection, even after earlier steps failed, and reports all failures
//! together.

use rusqlite::Connection;

use crate::config::{StorePaths, SyncSettings};
use crate::error::{CloseErrors, CloseStep, Error, Result};
use crate::model::{ArtworkBundle, KodiKind, PlaystateEvent, RemoteItem};
use crate::storage::{MirrorDb, StoreDomain, VideoDb, checkpoint};

use super::{
    IdentityIndex, MergeOutcome, PlaystateEventApplier, ReconcileStats, StateWriter, UserDataMerger,
};

enum Stores<'a> {
    /// Opened by the session; closed by it.
    Owned { mirror: MirrorDb, video: VideoDb },
    /// Supplied by the caller, who keeps ownership.
    Bound {
        identity: &'a dyn IdentityIndex,
        writer: &'a dyn StateWriter,
    },
    Closed,
}

/// A bounded unit of reconciliation work.
pub struct ReconciliationSession<'a> {
    id: String,
    stores: Stores<'a>,
    stats: ReconcileStats,
}

impl ReconciliationSession<'static> {
    /// Open all three databases and start a transaction on each.
    ///
    /// # Errors
    ///
    /// Returns an error if a database cannot be opened or a transaction
    /// cannot be started. Connections opened so far are dropped.
    pub fn open(paths: &StorePaths, settings: &SyncSettings) -> Result<Self> {
        let timeout = Some(settings.busy_timeout_ms);
        let mirror = MirrorDb::open(&paths.mirror, timeout)?;
        let video = VideoDb::open(&paths.video, &paths.textures, timeout)?;
        Self::from_stores(mirror, video)
    }

    /// Take ownership of already opened stores and start a transaction on each.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction cannot be started.
    pub fn from_stores(mirror: MirrorDb, video: VideoDb) -> Result<Self> {
        for conn in [mirror.conn(), video.conn(), video.texture_conn()] {
            conn.execute_batch("BEGIN")?;
        }

        let id = format!("rs_{}", &uuid::Uuid::new_v4().to_string()[..12]);
        tracing::info!(session = %id, "opened reconciliation session");
        Ok(Self {
            id,
            stores: Stores::Owned { mirror, video },
            stats: ReconcileStats::default(),
        })
    }

    /// Run `work` in a session that is closed afterwards, whatever happens.
    ///
    /// If both `work` and the close fail, the error from `work` is returned
    /// and the close failures are logged.
    ///
    /// # Errors
    ///
    /// Returns the error of opening, of `work`, or of closing, in that order
    /// of precedence.
    pub fn scope<R, F>(paths: &StorePaths, settings: &SyncSettings, work: F) -> Result<R>
    where
        F: FnOnce(&mut ReconciliationSession<'static>) -> Result<R>,
    {
        let mut session = Self::open(paths, settings)?;
        let outcome = work(&mut session);
        let closed = session.close();

        match (outcome, closed) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(_)) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::error!(error = %close_err, "session cleanup failed after work error");
                Err(err)
            }
        }
    }
}

impl<'a> ReconciliationSession<'a> {
    /// Bind to an identity index and writer owned by an outer scope.
    ///
    /// No transaction is started and closing leaves both untouched, so the
    /// outer scope decides when its connections commit.
    #[must_use]
    pub fn bound(identity: &'a dyn IdentityIndex, writer: &'a dyn StateWriter) -> Self {
        Self {
            id: format!("rs_{}", &uuid::Uuid::new_v4().to_string()[..12]),
            stores: Stores::Bound { identity, writer },
            stats: ReconcileStats::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    /// The identity index.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityIndex {
        match &self.stores {
            Stores::Owned { mirror, .. } => mirror,
            Stores::Bound { identity, .. } => *identity,
            Stores::Closed => unreachable!("session used after close"),
        }
    }

    /// The local state writer.
    #[must_use]
    pub fn writer(&self) -> &dyn StateWriter {
        match &self.stores {
            Stores::Owned { video, .. } => video,
            Stores::Bound { writer, .. } => *writer,
            Stores::Closed => unreachable!("session used after close"),
        }
    }

    /// Merge a remote item's full user data.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity lookup or a write fails.
    pub fn update_userdata(&mut self, item: &RemoteItem) -> Result<MergeOutcome> {
        let outcome = UserDataMerger::new(self.identity(), self.writer()).apply(item)?;
        self.stats.record(outcome);
        Ok(outcome)
    }

    /// Apply an event-stream playstate update.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn update_playstate(&mut self, event: &PlaystateEvent) -> Result<()> {
        PlaystateEventApplier::new(self.writer()).apply(event)?;
        self.stats.playstates += 1;
        Ok(())
    }

    /// Apply artwork to a local item; returns how many slots were written.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_fanart(&mut self, artwork: &ArtworkBundle, kodi_id: i64, kind: KodiKind) -> Result<usize> {
        let written = self.writer().modify_artwork(artwork, kodi_id, kind)?;
        self.stats.artwork_slots += written;
        Ok(written)
    }

    /// Commit, checkpoint and close every owned connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClose`] carrying every failed step.
    pub fn close(mut self) -> Result<ReconcileStats> {
        let stats = std::mem::take(&mut self.stats);
        let errors = self.release();
        if !errors.is_empty() {
            tracing::error!(session = %self.id, failures = errors.len(), "session closed with errors");
            return Err(Error::SessionClose(errors));
        }

        tracing::info!(
            session = %self.id,
            merged = stats.merged,
            skipped = stats.skipped,
            playstates = stats.playstates,
            artwork_slots = stats.artwork_slots,
            "closed reconciliation session"
        );
        Ok(stats)
    }

    fn release(&mut self) -> CloseErrors {
        match std::mem::replace(&mut self.stores, Stores::Closed) {
            Stores::Owned { mirror, video } => {
                let (video, textures) = video.into_connections();
                finish(
                    &self.id,
                    vec![
                        (StoreDomain::Mirror, mirror.into_connection()),
                        (StoreDomain::Video, video),
                        (StoreDomain::Textures, textures),
                    ],
                )
            }
            Stores::Bound { .. } | Stores::Closed => CloseErrors::default(),
        }
    }
}

impl Drop for ReconciliationSession<'_> {
    fn drop(&mut self) {
        if !matches!(self.stores, Stores::Owned { .. }) {
            return;
        }
        tracing::warn!(session = %self.id, "session dropped without close, closing now");
        let errors = self.release();
        if !errors.is_empty() {
            tracing::warn!(session = %self.id, error = %errors, "cleanup of dropped session failed");
        }
    }
}

/// Commit all, then checkpoint all, then close all.
///
/// A failed step never stops the remaining ones.
fn finish(session: &str, connections: Vec<(StoreDomain, Connection)>) -> CloseErrors {
    let mut errors = CloseErrors::default();

    for (domain, conn) in &connections {
        if conn.is_autocommit() {
            continue;
        }
        if let Err(e) = conn.execute_batch("COMMIT") {
            tracing::warn!(session, %domain, error = %e, "commit failed");
            errors.push(*domain, CloseStep::Commit, e);
        }
    }

    for (domain, conn) in &connections {
        if let Err(e) = checkpoint(conn) {
            tracing::warn!(session, %domain, error = %e, "checkpoint failed");
            errors.push(*domain, CloseStep::Checkpoint, e);
        }
    }

    for (domain, conn) in connections {
        if let Err((_conn, e)) = conn.close() {
            tracing::warn!(session, %domain, error = %e, "close failed");
            errors.push(domain, CloseStep::Close, e);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocalRecord, MediaKind, UserData};
    use crate::reconcile::SkipReason;
    use crate::reconcile::fakes::{Call, FakeIndex, RecordingWriter};
    use serde_json::json;
    use tempfile::TempDir;

    /// Data dir with one movie (remote 123 -> file 55, item 77) already linked.
    fn seeded() -> (TempDir, StorePaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = StorePaths::in_dir(dir.path());

        let mirror = MirrorDb::open(&paths.mirror, None).unwrap();
        mirror
            .add_item(
                "123",
                MediaKind::Movie,
                &LocalRecord {
                    file_id: Some(55),
                    item_id: 77,
                    kind: KodiKind::Movie,
                },
                0,
            )
            .unwrap();
        let video = VideoDb::open(&paths.video, &paths.textures, None).unwrap();
        video
            .conn()
            .execute_batch(
                "INSERT INTO files (idFile, strFilename) VALUES (55, 'a.mkv');
                 INSERT INTO movie (idMovie, idFile) VALUES (77, 55);",
            )
            .unwrap();

        (dir, paths)
    }

    fn reopen_video(paths: &StorePaths) -> VideoDb {
        VideoDb::open(&paths.video, &paths.textures, None).unwrap()
    }

    fn completed(file_id: i64) -> PlaystateEvent {
        PlaystateEvent {
            local_file_id: file_id,
            mark_played: true,
            view_count: Some(4),
            resume_ms: 5_400_000,
            duration_ms: 5_400_000,
            last_played: None,
            remote_type: MediaKind::Movie,
        }
    }

    fn remote(remote_id: &str) -> RemoteItem {
        RemoteItem {
            remote_id: remote_id.to_string(),
            remote_type: MediaKind::Movie,
            user_data: UserData {
                resume_ms: 60_000,
                runtime_ms: 120_000,
                play_count: Some(1),
                last_played: None,
                user_rating: Some(6.0),
            },
            payload: json!({"ratingKey": remote_id}),
        }
    }

    #[test]
    fn test_close_commits_and_counts() {
        let (_dir, paths) = seeded();

        let mut session = ReconciliationSession::open(&paths, &SyncSettings::default()).unwrap();
        assert!(session.update_userdata(&remote("123")).unwrap().is_applied());
        assert_eq!(
            session.update_userdata(&remote("404")).unwrap(),
            MergeOutcome::Skipped {
                reason: SkipReason::NotSynced
            }
        );
        let art = ArtworkBundle::new().with("poster", "http://a/p.jpg");
        assert_eq!(session.set_fanart(&art, 77, KodiKind::Movie).unwrap(), 1);

        let stats = session.close().unwrap();
        assert_eq!(
            stats,
            ReconcileStats {
                merged: 1,
                skipped: 1,
                playstates: 0,
                artwork_slots: 1,
            }
        );

        let video = reopen_video(&paths);
        let state = video.playstate(55).unwrap().unwrap();
        assert_eq!(state.play_count, Some(1));
        assert_eq!(state.resume, Some((60.0, 120.0)));
        assert_eq!(video.user_rating(77, KodiKind::Movie).unwrap(), Some(6));
        assert_eq!(
            video.artwork(77, KodiKind::Movie).unwrap().get("poster"),
            Some("http://a/p.jpg")
        );
    }

    /// Mirror store of a session that opened its own connections.
    fn owned_mirror<'s>(session: &'s ReconciliationSession<'_>) -> &'s MirrorDb {
        match &session.stores {
            Stores::Owned { mirror, .. } => mirror,
            _ => panic!("session does not own its stores"),
        }
    }

    /// Poster `old.jpg` on movie 77, with a cached texture for it.
    fn seed_cached_poster(paths: &StorePaths) {
        let video = reopen_video(paths);
        video
            .conn()
            .execute(
                "INSERT INTO art (media_id, media_type, type, url) VALUES (77, 'movie', 'poster', 'old.jpg')",
                [],
            )
            .unwrap();
        video
            .texture_conn()
            .execute_batch(
                "INSERT INTO texture (id, url, cachedurl) VALUES (1, 'old.jpg', 'a/b.jpg');
                 INSERT INTO sizes (idtexture, size) VALUES (1, 1);",
            )
            .unwrap();
    }

    fn cached_textures(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM texture", [], |row| row.get(0))
            .unwrap()
    }

    fn wal_len(db: &std::path::Path) -> u64 {
        let mut wal = db.as_os_str().to_owned();
        wal.push("-wal");
        std::fs::metadata(wal).map_or(0, |m| m.len())
    }

    #[test]
    fn test_commit_failure_does_not_stop_other_domains() {
        let (_dir, paths) = seeded();
        seed_cached_poster(&paths);
        {
            let mirror = MirrorDb::open(&paths.mirror, None).unwrap();
            mirror
                .conn()
                .execute_batch(
                    "CREATE TABLE parent (id INTEGER PRIMARY KEY);
                     CREATE TABLE child (
                         parent_id INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
                     );",
                )
                .unwrap();
        }

        let mut session = ReconciliationSession::open(&paths, &SyncSettings::default()).unwrap();
        // Violation is only detected at COMMIT
        owned_mirror(&session)
            .conn()
            .execute("INSERT INTO child (parent_id) VALUES (42)", [])
            .unwrap();
        session.update_playstate(&completed(55)).unwrap();
        let art = ArtworkBundle::new().with("poster", "new.jpg");
        assert_eq!(session.set_fanart(&art, 77, KodiKind::Movie).unwrap(), 1);

        let err = session.close().unwrap_err();
        let Error::SessionClose(failures) = &err else {
            panic!("expected SessionClose, got {err:?}");
        };
        let first = failures.first().unwrap();
        assert_eq!(first.domain, StoreDomain::Mirror);
        assert_eq!(first.step, CloseStep::Commit);
        assert!(err.to_string().contains("mirror commit failed"));

        // Video and texture writes were still committed
        let video = reopen_video(&paths);
        let state = video.playstate(55).unwrap().unwrap();
        assert_eq!(state.play_count, Some(5));
        assert_eq!(state.resume, None);
        assert_eq!(
            video.artwork(77, KodiKind::Movie).unwrap().get("poster"),
            Some("new.jpg")
        );
        assert_eq!(cached_textures(video.texture_conn()), 0);
    }

    #[test]
    fn test_close_checkpoints_every_domain() {
        let (_dir, paths) = seeded();
        seed_cached_poster(&paths);

        // Idle readers keep each log file around after the session closes
        let readers: Vec<Connection> = StoreDomain::ALL
            .into_iter()
            .map(|domain| Connection::open(paths.get(domain)).unwrap())
            .collect();

        let mut session = ReconciliationSession::open(&paths, &SyncSettings::default()).unwrap();
        owned_mirror(&session)
            .add_item(
                "456",
                MediaKind::Movie,
                &LocalRecord {
                    file_id: Some(55),
                    item_id: 77,
                    kind: KodiKind::Movie,
                },
                0,
            )
            .unwrap();
        session.update_userdata(&remote("123")).unwrap();
        let art = ArtworkBundle::new().with("poster", "new.jpg");
        session.set_fanart(&art, 77, KodiKind::Movie).unwrap();
        session.close().unwrap();

        for domain in StoreDomain::ALL {
            assert_eq!(wal_len(paths.get(domain)), 0, "{domain} log not truncated");
        }
        assert_eq!(cached_textures(&readers[2]), 0);
        let linked: i64 = readers[0]
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .unwrap();
        assert_eq!(linked, 2);
    }

    #[test]
    fn test_scope_commits_even_when_work_fails() {
        let (_dir, paths) = seeded();

        let result: Result<()> =
            ReconciliationSession::scope(&paths, &SyncSettings::default(), |session| {
                session.update_playstate(&completed(55))?;
                Err(Error::InvalidArgument("stop".to_string()))
            });

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        let state = reopen_video(&paths).playstate(55).unwrap().unwrap();
        assert_eq!(state.play_count, Some(5));
    }

    #[test]
    fn test_scope_returns_work_value() {
        let (_dir, paths) = seeded();

        let merged = ReconciliationSession::scope(&paths, &SyncSettings::default(), |session| {
            session.update_userdata(&remote("123"))?;
            Ok(session.stats().merged)
        })
        .unwrap();

        assert_eq!(merged, 1);
    }

    #[test]
    fn test_drop_without_close_still_commits() {
        let (_dir, paths) = seeded();
        {
            let mut session =
                ReconciliationSession::open(&paths, &SyncSettings::default()).unwrap();
            session.update_playstate(&completed(55)).unwrap();
        }

        let state = reopen_video(&paths).playstate(55).unwrap().unwrap();
        assert_eq!(state.play_count, Some(5));
    }

    #[test]
    fn test_bound_session_leaves_stores_open() {
        let mirror = MirrorDb::open_memory().unwrap();
        let video = VideoDb::open_memory().unwrap();
        video
            .conn()
            .execute("INSERT INTO files (idFile) VALUES (9)", [])
            .unwrap();

        let mut session = ReconciliationSession::bound(&mirror, &video);
        session.update_playstate(&completed(9)).unwrap();
        assert_eq!(session.close().unwrap().playstates, 1);

        // Caller still owns working connections
        assert_eq!(video.playstate(9).unwrap().unwrap().play_count, Some(5));
        assert_eq!(mirror.count_items().unwrap(), 0);
    }

    #[test]
    fn test_bound_session_composes_with_any_writer() {
        let record = LocalRecord {
            file_id: Some(55),
            item_id: 77,
            kind: KodiKind::Movie,
        };
        let index = FakeIndex::default().with("123", MediaKind::Movie, record);
        let writer = RecordingWriter::default();

        let mut session = ReconciliationSession::bound(&index, &writer);
        assert!(session.update_userdata(&remote("123")).unwrap().is_applied());
        let art = ArtworkBundle::new().with("poster", "p.jpg").with("fanart", "f.jpg");
        assert_eq!(session.set_fanart(&art, 77, KodiKind::Movie).unwrap(), 2);
        let stats = session.close().unwrap();

        assert_eq!(stats.merged, 1);
        assert_eq!(stats.artwork_slots, 2);
        let calls = writer.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], Call::SetResume { file_id: 55, .. }));
        assert!(matches!(calls[1], Call::UpdateUserRating { item_id: 77, .. }));
        assert!(matches!(calls[2], Call::ModifyArtwork { slots: 2, .. }));
    }
}

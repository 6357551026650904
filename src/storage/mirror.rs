//! Identity index: remote item id + remote type → local record.

use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::error::Result;
use crate::model::{KodiKind, LocalRecord, MediaKind};
use crate::storage::{StoreDomain, open_store, open_store_in_memory};

/// The mirror database holding the identity index.
#[derive(Debug)]
pub struct MirrorDb {
    conn: Connection,
}

impl MirrorDb {
    /// Wrap an already configured connection.
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open the mirror database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        open_store(StoreDomain::Mirror, path, timeout_ms).map(Self::new)
    }

    /// Open an in-memory mirror (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        open_store_in_memory(StoreDomain::Mirror).map(Self::new)
    }

    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Give up the wrapper and return the connection.
    #[must_use]
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Look up where a remote item lives locally.
    ///
    /// A missing mapping is `Ok(None)`; the caller decides whether that matters.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored local type is unknown.
    pub fn item_by_id(&self, remote_id: &str, kind: MediaKind) -> Result<Option<LocalRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT kodi_id, kodi_fileid, kodi_type FROM items
                 WHERE remote_id = ?1 AND remote_type = ?2",
                rusqlite::params![remote_id, kind.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(item_id, file_id, kodi_type)| -> Result<LocalRecord> {
            let kind = kodi_type
                .parse::<KodiKind>()
                .map_err(crate::error::Error::Other)?;
            Ok(LocalRecord {
                file_id,
                item_id,
                kind,
            })
        })
        .transpose()
    }

    /// Record (or replace) the local location of a remote item.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn add_item(
        &self,
        remote_id: &str,
        kind: MediaKind,
        record: &LocalRecord,
        last_sync: i64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO items (remote_id, remote_type, kodi_id, kodi_fileid, kodi_type, last_sync)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(remote_id, remote_type) DO UPDATE SET
               kodi_id = excluded.kodi_id,
               kodi_fileid = excluded.kodi_fileid,
               kodi_type = excluded.kodi_type,
               last_sync = excluded.last_sync",
            rusqlite::params![
                remote_id,
                kind.as_str(),
                record.item_id,
                record.file_id,
                record.kind.as_str(),
                last_sync,
            ],
        )?;
        Ok(())
    }

    /// Number of mapped items.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_items(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

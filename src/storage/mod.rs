//! SQLite storage layer for Mediasync.
//!
//! Reconciliation touches three independently owned databases, one
//! connection each:
//! - the **mirror** index mapping remote ids to local ids ([`MirrorDb`])
//! - the local media-center **video** library ([`VideoDb`])
//! - the media-center **textures** cache, written alongside artwork
//!
//! Every connection runs in WAL mode. Whoever owns a connection is
//! responsible for committing and checkpointing it.
//!
//! # Submodules
//!
//! - [`schema`] - DDL and connection pragmas for each domain
//! - [`mirror`] - identity index
//! - [`video`] - playstate, rating and artwork writer

pub mod mirror;
pub mod schema;
pub mod video;

pub use mirror::MirrorDb;
pub use video::{FilePlaystate, VideoDb};

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Default busy timeout when none is configured.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// One of the storage domains a reconciliation session holds open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreDomain {
    Mirror,
    Video,
    Textures,
}

impl StoreDomain {
    /// All domains, in the order sessions open and close them.
    pub const ALL: [Self; 3] = [Self::Mirror, Self::Video, Self::Textures];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mirror => "mirror",
            Self::Video => "video",
            Self::Textures => "textures",
        }
    }
}

impl std::fmt::Display for StoreDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open a domain database at `path` and make sure its schema exists.
///
/// # Errors
///
/// Returns an error if the connection cannot be established or schema fails.
pub fn open_store(domain: StoreDomain, path: &Path, timeout_ms: Option<u64>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_millis(
        timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
    ))?;
    schema::apply_schema(&conn, domain)?;
    tracing::debug!(%domain, path = %path.display(), "opened store");
    Ok(conn)
}

/// Open an in-memory domain database (for testing).
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub fn open_store_in_memory(domain: StoreDomain) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    schema::apply_schema(&conn, domain)?;
    Ok(conn)
}

/// Flush and truncate the write-ahead log of a connection.
///
/// Safe to call repeatedly. A checkpoint blocked by another reader is not an
/// error; it is retried on the next session exit.
///
/// # Errors
///
/// Returns an error if the pragma itself fails.
pub fn checkpoint(conn: &Connection) -> rusqlite::Result<()> {
    let (busy, log_frames, checkpointed): (i64, i64, i64) =
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
    if busy != 0 {
        tracing::debug!(log_frames, checkpointed, "wal checkpoint could not complete");
    }
    Ok(())
}

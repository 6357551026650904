//! Playstate reconciliation between the remote server and the local mirror.
//!
//! Two update paths feed the same local writer:
//!
//! - **Full record** ([`UserDataMerger`]): a remote item with its complete
//!   user data. Identity is resolved here, through the mirror index.
//! - **Event stream** ([`PlaystateEventApplier`]): discrete playstate fields
//!   for a file the event producer has already resolved. Completion is
//!   turned into a play-count increment and a cleared resume point.
//!
//! Both run inside a [`ReconciliationSession`], which owns the storage
//! connections and commits, checkpoints and closes all of them on exit.
//!
//! # Example
//!
//! ```ignore
//! use mediasync::reconcile::ReconciliationSession;
//!
//! let processed = ReconciliationSession::scope(&paths, &settings, |session| {
//!     for item in &items {
//!         session.update_userdata(item)?;
//!     }
//!     Ok(session.stats().merged)
//! })?;
//! ```

mod playstate;
mod session;
mod types;
mod userdata;

pub use playstate::{PlaystateEventApplier, next_view_count};
pub use session::ReconciliationSession;
pub use types::{MergeOutcome, ReconcileStats, SkipReason};
pub use userdata::UserDataMerger;

use chrono::NaiveDateTime;
use std::time::Duration;

use crate::error::Result;
use crate::model::{ArtworkBundle, KodiKind, LocalRecord, MediaKind};
use crate::storage::{MirrorDb, VideoDb};

/// Lookup from remote identity to local record.
pub trait IdentityIndex {
    /// `Ok(None)` when the remote item has not been synced yet.
    ///
    /// # Errors
    ///
    /// Returns an error only when the lookup itself fails.
    fn item_by_id(&self, remote_id: &str, kind: MediaKind) -> Result<Option<LocalRecord>>;
}

/// Mutations reconciliation applies to the local library.
///
/// Every operation is idempotent: applying the same input twice leaves the
/// same stored state as applying it once.
pub trait StateWriter {
    /// Store watched state and resume point of a local file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set_resume(
        &self,
        file_id: i64,
        resume: Duration,
        runtime: Duration,
        play_count: Option<i64>,
        last_played: Option<NaiveDateTime>,
        kind: MediaKind,
    ) -> Result<()>;

    /// Store the user rating of a local item.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn update_user_rating(&self, item_id: i64, kind: KodiKind, rating: Option<f64>) -> Result<()>;

    /// Apply the slots present in `artwork`; returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn modify_artwork(&self, artwork: &ArtworkBundle, item_id: i64, kind: KodiKind) -> Result<usize>;
}

impl IdentityIndex for MirrorDb {
    fn item_by_id(&self, remote_id: &str, kind: MediaKind) -> Result<Option<LocalRecord>> {
        MirrorDb::item_by_id(self, remote_id, kind)
    }
}

impl StateWriter for VideoDb {
    fn set_resume(
        &self,
        file_id: i64,
        resume: Duration,
        runtime: Duration,
        play_count: Option<i64>,
        last_played: Option<NaiveDateTime>,
        kind: MediaKind,
    ) -> Result<()> {
        VideoDb::set_resume(self, file_id, resume, runtime, play_count, last_played, kind)
    }

    fn update_user_rating(&self, item_id: i64, kind: KodiKind, rating: Option<f64>) -> Result<()> {
        VideoDb::update_user_rating(self, item_id, kind, rating)
    }

    fn modify_artwork(&self, artwork: &ArtworkBundle, item_id: i64, kind: KodiKind) -> Result<usize> {
        VideoDb::modify_artwork(self, artwork, item_id, kind)
    }
}

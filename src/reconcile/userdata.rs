//! Full-record merge of remote user data into the local library.

use crate::error::Result;
use crate::model::RemoteItem;
use crate::model::units::{from_remote_ms, remote_epoch_to_local};

use super::{IdentityIndex, MergeOutcome, SkipReason, StateWriter};

/// Merges a remote item's user data into its local record.
///
/// Writes either nothing (the item is not synced locally, or has no file)
/// or exactly two things: the playstate, then the rating.
pub struct UserDataMerger<'a, I: ?Sized, W: ?Sized> {
    identity: &'a I,
    writer: &'a W,
}

impl<'a, I, W> UserDataMerger<'a, I, W>
where
    I: IdentityIndex + ?Sized,
    W: StateWriter + ?Sized,
{
    #[must_use]
    pub fn new(identity: &'a I, writer: &'a W) -> Self {
        Self { identity, writer }
    }

    /// Merge one remote item.
    ///
    /// A remote item with no local counterpart is logged and skipped; it is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity lookup or a write fails.
    pub fn apply(&self, item: &RemoteItem) -> Result<MergeOutcome> {
        let Some(record) = self.identity.item_by_id(&item.remote_id, item.remote_type)? else {
            tracing::error!(
                remote_id = %item.remote_id,
                remote_type = %item.remote_type,
                payload = %item.payload,
                "item not yet synced locally, skipping userdata update"
            );
            return Ok(MergeOutcome::Skipped {
                reason: SkipReason::NotSynced,
            });
        };

        let Some(file_id) = record.file_id else {
            tracing::warn!(
                remote_id = %item.remote_id,
                kind = %record.kind,
                item_id = record.item_id,
                "local item has no file, skipping userdata update"
            );
            return Ok(MergeOutcome::Skipped {
                reason: SkipReason::NoFile,
            });
        };

        let data = &item.user_data;
        self.writer.set_resume(
            file_id,
            from_remote_ms(data.resume_ms),
            from_remote_ms(data.runtime_ms),
            data.play_count,
            data.last_played.and_then(remote_epoch_to_local),
            item.remote_type,
        )?;
        self.writer
            .update_user_rating(record.item_id, record.kind, data.user_rating)?;

        tracing::debug!(remote_id = %item.remote_id, file_id, "merged userdata");
        Ok(MergeOutcome::Applied {
            file_id,
            item_id: record.item_id,
        })
    }
}

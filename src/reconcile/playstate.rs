//! Event-stream playstate updates.

use crate::error::Result;
use crate::model::PlaystateEvent;
use crate::model::units::{from_remote_ms, remote_epoch_to_local};

use super::StateWriter;

/// Play count after one more completed viewing.
///
/// A missing, negative or saturated prior count starts over at 1.
#[must_use]
pub fn next_view_count(prior: Option<i64>) -> i64 {
    match prior.filter(|count| *count >= 0).and_then(|count| count.checked_add(1)) {
        Some(next) => next,
        None => {
            if prior.is_some() {
                tracing::debug!(?prior, "unusable prior view count, starting at 1");
            }
            1
        }
    }
}

/// Applies playstate events for files the producer already resolved.
///
/// Each event results in exactly one playstate write.
pub struct PlaystateEventApplier<'a, W: ?Sized> {
    writer: &'a W,
}

impl<'a, W: StateWriter + ?Sized> PlaystateEventApplier<'a, W> {
    #[must_use]
    pub fn new(writer: &'a W) -> Self {
        Self { writer }
    }

    /// Apply one event.
    ///
    /// A completed viewing clears the resume point and bumps the view count;
    /// otherwise position and count are stored as given.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn apply(&self, event: &PlaystateEvent) -> Result<()> {
        let (resume_ms, view_count) = if event.mark_played {
            tracing::info!(
                file_id = event.local_file_id,
                kind = %event.remote_type,
                "marking item as completely watched"
            );
            (0, Some(next_view_count(event.view_count)))
        } else {
            (event.resume_ms, event.view_count)
        };

        self.writer.set_resume(
            event.local_file_id,
            from_remote_ms(resume_ms),
            from_remote_ms(event.duration_ms),
            view_count,
            event.last_played.and_then(remote_epoch_to_local),
            event.remote_type,
        )
    }
}

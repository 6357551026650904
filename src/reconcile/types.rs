//! Outcome and statistics types for reconciliation.

use serde::Serialize;

/// Why a full-record merge left the local library untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The remote item has no local record yet.
    NotSynced,
    /// The local record is a container (show, season) without a file.
    NoFile,
}

/// Result of merging one remote item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Playstate and rating were both written.
    Applied { file_id: i64, item_id: i64 },
    /// Nothing was written.
    Skipped { reason: SkipReason },
}

impl MergeOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Counters for one reconciliation session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Remote items whose user data was merged.
    pub merged: usize,
    /// Remote items left untouched: not synced yet, or without a local file.
    pub skipped: usize,
    /// Event-stream playstate updates applied.
    pub playstates: usize,
    /// Artwork slots written.
    pub artwork_slots: usize,
}

impl ReconcileStats {
    /// Count a merge outcome.
    pub fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Applied { .. } => self.merged += 1,
            MergeOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Total number of updates processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.merged + self.skipped + self.playstates
    }

    /// Returns true if nothing was processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0 && self.artwork_slots == 0
    }
}

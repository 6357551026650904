//! Data models for Mediasync.
//!
//! This module contains the domain types that flow through reconciliation:
//! - `MediaKind` / `KodiKind` and the `LocalRecord` identity mapping
//! - `RemoteItem` with its `UserData` bundle (full-record path)
//! - `PlaystateEvent` (event-stream path)
//! - `ArtworkBundle`
//! - unit conversion between the remote server and the local store

pub mod artwork;
pub mod event;
pub mod media;
pub mod remote;
pub mod units;

pub use artwork::ArtworkBundle;
pub use event::{PlaystateEvent, RawPlaystate};
pub use media::{KodiKind, LocalRecord, MediaKind};
pub use remote::{RemoteItem, UserData};

//! Mediasync - playstate reconciliation between a remote media server and a
//! local media-center library.
//!
//! This crate provides the core functionality for the `mediasync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (remote items, local records, events, artwork)
//! - [`storage`] - SQLite databases: mirror index, video library, textures
//! - [`reconcile`] - Reconciliation session, userdata merge, playstate events
//! - [`feed`] - JSONL input feeds
//! - [`paths`] - Play path splitting
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod model;
pub mod paths;
pub mod reconcile;
pub mod storage;

pub use error::{Error, Result};

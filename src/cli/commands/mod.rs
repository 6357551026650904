//! Command implementations.

pub mod artwork;
pub mod completions;
pub mod init;
pub mod link;
pub mod playstate;
pub mod split_path;
pub mod status;
pub mod userdata;
pub mod version;

use crate::config::StorePaths;
use crate::error::{Error, Result};

/// Fail with [`Error::NotInitialized`] unless every database exists.
fn require_initialized(paths: &StorePaths) -> Result<()> {
    let missing = paths.missing();
    if missing.is_empty() {
        return Ok(());
    }
    for domain in &missing {
        tracing::debug!(%domain, path = %paths.get(*domain).display(), "database missing");
    }
    Err(Error::NotInitialized)
}

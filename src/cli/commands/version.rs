//! Version command implementation.

use crate::config::DEFAULT_MARK_PLAYED_AT;
use crate::error::Result;
use crate::storage::StoreDomain;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput {
    version: &'static str,
    sqlite: &'static str,
    domains: Vec<&'static str>,
    default_mark_played_at: f64,
}

fn current() -> VersionOutput {
    VersionOutput {
        version: env!("CARGO_PKG_VERSION"),
        sqlite: rusqlite::version(),
        domains: StoreDomain::ALL.iter().map(StoreDomain::as_str).collect(),
        default_mark_played_at: DEFAULT_MARK_PLAYED_AT,
    }
}

/// Print the crate version and the bundled SQLite it writes with.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = current();
    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("mediasync {} (sqlite {})", output.version, output.sqlite);
        println!("  stores: {}", output.domains.join(", "));
    }
    Ok(())
}

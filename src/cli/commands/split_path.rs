//! Split-path command implementation.

use crate::error::Result;
use crate::paths::split_play_path;
use serde::Serialize;

#[derive(Serialize)]
struct SplitPathOutput<'a> {
    url: &'a str,
    path: String,
    top_level_path: String,
}

/// Execute the split-path command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(url: &str, json: bool) -> Result<()> {
    let (path, top_level_path) = split_play_path(url);

    if json {
        let output = SplitPathOutput {
            url,
            path,
            top_level_path,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Path:      {path}");
        println!("Top level: {top_level_path}");
    }

    Ok(())
}

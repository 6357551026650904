//! Play path splitting.
//!
//! Play URLs come from the remote server and may name a path on another
//! machine, so host-OS path handling never applies. A URL containing a
//! backslash is a local Windows path; anything else is a network path.

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Split a play URL into its directory path and the top-level path above it.
///
/// Both results end with the separator of the URL's flavor. The top-level
/// path is the grand-parent of the URL.
///
/// ```
/// use mediasync::paths::split_play_path;
///
/// let (path, top) = split_play_path("smb://nas/media/movies");
/// assert_eq!(path, "smb://nas/media/movies/");
/// assert_eq!(top, "smb://nas/media/");
/// ```
#[must_use]
pub fn split_play_path(play_url: &str) -> (String, String) {
    let sep = if play_url.contains('\\') { '\\' } else { '/' };
    let path = format!("{play_url}{sep}");
    let top_level = format!("{}{sep}", dirname(dirname(&path)));
    (path, top_level)
}

/// Directory part of a path, treating both separators alike.
///
/// Trailing separators of the result are dropped unless it is a root.
fn dirname(path: &str) -> &str {
    let (drive, rest) = split_drive(path);
    let Some(i) = rest.rfind(SEPARATORS) else {
        return drive;
    };
    let head = &rest[..=i];
    let trimmed = head.trim_end_matches(SEPARATORS);
    let head = if trimmed.is_empty() { head } else { trimmed };
    &path[..drive.len() + head.len()]
}

/// Split off a `C:` style drive prefix.
fn split_drive(path: &str) -> (&str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        path.split_at(2)
    } else {
        ("", path)
    }
}

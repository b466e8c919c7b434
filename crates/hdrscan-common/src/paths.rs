//! Path utilities for detecting video files by extension.

use std::path::Path;

/// Container extensions picked up by a library scan when none are configured.
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "m4v", "ts", "hevc"];

/// Check if a path has one of the default video extensions.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use hdrscan_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("/media/Movie (2021).MKV")));
/// assert!(!is_video_file(Path::new("poster.jpg")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check a path against an explicit extension list (case-insensitive, no dot).
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Get the default list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

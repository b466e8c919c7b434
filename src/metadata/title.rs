//! File-name parsing for provider lookups.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!(stringify!($name), " is valid")));
    };
}

pattern!(TMDB_ID, r"(?i)\{tmdb-(\d+)\}");
pattern!(YEAR, r"\b(19|20)\d{2}\b");
pattern!(RESOLUTION, r"(?i)\b(480|720|1080|2160)[pi]\b");
pattern!(CODEC, r"(?i)\b(x264|x265|h264|h265|hevc)\b");
pattern!(SOURCE, r"(?i)\b(BluRay|BRRip|WEBRip|WEB-DL|HDRip|DVDRip)\b");
pattern!(DYNAMIC_RANGE, r"(?i)\b(DV|HDR10\+?|HLG|SDR|Dolby[.\s]?Vision)\b");
pattern!(BRACKETED, r"[\[(].*?[\])]");
pattern!(SEPARATOR, r"[._\-]");
pattern!(WHITESPACE, r"\s+");

/// Longest query sent to a search endpoint.
pub const MAX_QUERY_CHARS: usize = 200;

/// TMDB id embedded as `{tmdb-12345}` in a file name.
pub fn extract_tmdb_id(filename: &str) -> Option<String> {
    TMDB_ID
        .captures(filename)
        .map(|caps| caps[1].to_string())
}

/// Search title derived from a file name: release tags, years, brackets and
/// separators removed.
pub fn search_query(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let mut name = TMDB_ID.replace_all(&stem, "").into_owned();
    for pattern in [&YEAR, &RESOLUTION, &CODEC, &SOURCE, &DYNAMIC_RANGE, &BRACKETED] {
        name = pattern.replace_all(&name, "").into_owned();
    }
    let name = SEPARATOR.replace_all(&name, " ");
    WHITESPACE.replace_all(&name, " ").trim().to_string()
}

/// Whether `query` is a usable search term.
pub fn is_valid_query(query: &str) -> bool {
    let len = query.trim().chars().count();
    (1..=MAX_QUERY_CHARS).contains(&len)
}

/// Whether `id` looks like a TMDB id.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

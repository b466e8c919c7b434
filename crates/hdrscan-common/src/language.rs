//! Language code variants.
//!
//! Container metadata tags audio tracks inconsistently: ISO 639-1 (`de`),
//! ISO 639-2/B (`ger`), ISO 639-2/T (`deu`) or the English name. A configured
//! content language is expanded to every spelling before track selection.

/// Code variants keyed by ISO 639-1 code. All entries are lowercase.
const LANGUAGE_VARIANTS: &[(&str, &[&str])] = &[
    ("en", &["eng", "en", "english"]),
    ("de", &["ger", "deu", "de", "german"]),
    ("ru", &["rus", "ru", "russian"]),
    ("bg", &["bul", "bg", "bulgarian"]),
    ("fr", &["fre", "fra", "fr", "french"]),
    ("es", &["spa", "es", "spanish"]),
    ("it", &["ita", "it", "italian"]),
    ("pt", &["por", "pt", "portuguese"]),
    ("ja", &["jpn", "ja", "japanese"]),
    ("ko", &["kor", "ko", "korean"]),
    ("zh", &["chi", "zho", "zh", "chinese"]),
    ("nl", &["dut", "nld", "nl", "dutch"]),
    ("pl", &["pol", "pl", "polish"]),
    ("sv", &["swe", "sv", "swedish"]),
    ("no", &["nor", "no", "norwegian"]),
    ("da", &["dan", "da", "danish"]),
    ("fi", &["fin", "fi", "finnish"]),
    ("tr", &["tur", "tr", "turkish"]),
    ("ar", &["ara", "ar", "arabic"]),
    ("he", &["heb", "he", "hebrew"]),
    ("hi", &["hin", "hi", "hindi"]),
    ("th", &["tha", "th", "thai"]),
    ("cs", &["cze", "ces", "cs", "czech"]),
    ("hu", &["hun", "hu", "hungarian"]),
    ("ro", &["rum", "ron", "ro", "romanian"]),
    ("el", &["gre", "ell", "el", "greek"]),
    ("uk", &["ukr", "uk", "ukrainian"]),
];

/// The language every lookup falls back to.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Known spellings for an ISO 639-1 code, or `None` for an unlisted code.
pub fn variants(code: &str) -> Option<&'static [&'static str]> {
    let code = code.trim();
    LANGUAGE_VARIANTS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(code))
        .map(|(_, variants)| *variants)
}

/// Whether a track language tag names the given content language.
///
/// Unlisted content languages only match their own code.
///
/// ```
/// use hdrscan_common::language::matches;
///
/// assert!(matches("fr", "fra"));
/// assert!(matches("fr", "French"));
/// assert!(!matches("fr", "eng"));
/// assert!(matches("xx", "XX"));
/// ```
pub fn matches(content_language: &str, tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        return false;
    }
    match variants(content_language) {
        Some(known) => known.contains(&tag.as_str()),
        None => content_language.trim().eq_ignore_ascii_case(&tag),
    }
}

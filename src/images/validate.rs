//! Artwork URL allow-list.
//!
//! Every URL that reaches the cache came out of a provider response, so it is
//! untrusted. A URL is accepted only when it matches one [`AllowedSource`]
//! exactly: scheme, host, port and a path prefix, with no userinfo.

use reqwest::Url;

/// One trusted artwork origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedSource {
    /// Tag used in cache keys (`tmdb`, `fanart`).
    pub provider: String,
    pub scheme: String,
    pub host: String,
    /// `None` means the scheme's default port.
    pub port: Option<u16>,
    pub path_prefix: String,
}

impl AllowedSource {
    pub fn new(provider: &str, scheme: &str, host: &str, port: Option<u16>, path_prefix: &str) -> Self {
        Self {
            provider: provider.to_string(),
            scheme: scheme.to_string(),
            host: host.to_ascii_lowercase(),
            port,
            path_prefix: path_prefix.to_string(),
        }
    }

    /// TMDB image CDN.
    pub fn tmdb() -> Self {
        Self::new("tmdb", "https", "image.tmdb.org", None, "/t/p/")
    }

    /// Fanart.tv asset host.
    pub fn fanart() -> Self {
        Self::new("fanart", "https", "assets.fanart.tv", None, "/fanart/")
    }

    /// The production allow-list.
    pub fn defaults() -> Vec<Self> {
        vec![Self::tmdb(), Self::fanart()]
    }

    /// Whether an already-parsed URL belongs to this source.
    fn admits(&self, url: &Url) -> bool {
        // Url normalizes dot segments, so the prefix check sees the final path.
        url.scheme() == self.scheme
            && url.host_str() == Some(self.host.as_str())
            && url.port() == self.port
            && url.username().is_empty()
            && url.password().is_none()
            && url.path().starts_with(&self.path_prefix)
    }
}

/// Find the allow-list entry that admits `raw`, if any.
pub fn match_source<'a>(sources: &'a [AllowedSource], raw: &str) -> Option<&'a AllowedSource> {
    let url = Url::parse(raw.trim()).ok()?;
    sources.iter().find(|s| s.admits(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(url: &str) -> Option<String> {
        match_source(&AllowedSource::defaults(), url).map(|s| s.provider.clone())
    }

    #[test]
    fn accepts_known_cdns() {
        assert_eq!(
            check("https://image.tmdb.org/t/p/original/abc.jpg").as_deref(),
            Some("tmdb")
        );
        assert_eq!(
            check("https://assets.fanart.tv/fanart/movies/603/moviethumb/x.jpg").as_deref(),
            Some("fanart")
        );
        assert_eq!(
            check("https://IMAGE.TMDB.ORG/t/p/w500/abc.jpg").as_deref(),
            Some("tmdb")
        );
    }

    #[test]
    fn rejects_wrong_scheme_host_or_path() {
        assert_eq!(check("http://image.tmdb.org/t/p/original/a.jpg"), None);
        assert_eq!(check("https://image.tmdb.org.evil.com/t/p/a.jpg"), None);
        assert_eq!(check("https://evil.image.tmdb.org/t/p/a.jpg"), None);
        assert_eq!(check("https://image.tmdb.org/other/a.jpg"), None);
        assert_eq!(check("https://image.tmdb.org/t/p/../../etc/passwd"), None);
        assert_eq!(check("not a url"), None);
        assert_eq!(check(""), None);
    }

    #[test]
    fn rejects_userinfo_and_ports() {
        assert_eq!(check("https://user@image.tmdb.org/t/p/original/a.jpg"), None);
        assert_eq!(check("https://u:p@image.tmdb.org/t/p/original/a.jpg"), None);
        assert_eq!(check("https://image.tmdb.org:8443/t/p/original/a.jpg"), None);
        // Explicit default port normalizes away.
        assert_eq!(
            check("https://image.tmdb.org:443/t/p/original/a.jpg").as_deref(),
            Some("tmdb")
        );
    }

    #[test]
    fn custom_source_with_port() {
        let sources = [AllowedSource::new("tmdb", "http", "127.0.0.1", Some(8080), "/t/p/")];
        assert!(match_source(&sources, "http://127.0.0.1:8080/t/p/original/a.jpg").is_some());
        assert!(match_source(&sources, "http://127.0.0.1:9090/t/p/original/a.jpg").is_none());
    }
}

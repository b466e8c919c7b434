//! Artwork cache, enrichment and artwork migration against a mock image host.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{mock_source, offline_tmdb, TestLibrary};
use hdrscan::images::{AllowedSource, ArtworkCache, CacheOutcome};
use hdrscan::metadata::providers::{FanartClient, TmdbClient};
use hdrscan::metadata::{ArtworkProvider, Enricher};
use hdrscan::state::{ArtworkRef, MediaRecord};
use hdrscan::Error;
use hdrscan_common::HdrClassification;
use serde_json::json;
use tokio::io::AsyncReadExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JPEG: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

async fn image_host() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fanart/movies/603/thumb.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fanart/broken.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fanart/empty.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

fn cache_for(dir: &std::path::Path, server: &MockServer) -> ArtworkCache {
    ArtworkCache::new(dir, Duration::from_secs(5))
        .unwrap()
        .with_allowed_sources(vec![mock_source(server, "fanart", "/fanart/")])
}

#[tokio::test]
async fn store_downloads_once_and_serves_by_key() {
    let server = image_host().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_for(dir.path(), &server);
    let url = format!("{}/fanart/movies/603/thumb.jpg", server.uri());

    let outcome = cache.store(&url, Some("603")).await;
    assert_eq!(outcome, CacheOutcome::Cached("fanart_603.jpg".into()));
    assert!(cache.contains("fanart_603.jpg"));

    let mut file = cache.open("fanart_603.jpg").await.unwrap();
    let mut body = Vec::new();
    file.read_to_end(&mut body).await.unwrap();
    assert_eq!(body, JPEG);

    // A second store finds the file and does not download again.
    assert_eq!(cache.store(&url, Some("603")).await, CacheOutcome::Cached("fanart_603.jpg".into()));
    let hits = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/fanart/movies/603/thumb.jpg")
        .count();
    assert_eq!(hits, 1);
}

#[tokio::test]
async fn store_without_id_uses_hashed_key() {
    let server = image_host().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_for(dir.path(), &server);
    let url = format!("{}/fanart/movies/603/thumb.jpg", server.uri());

    let CacheOutcome::Cached(key) = cache.store(&url, None).await else {
        panic!("expected a cached outcome");
    };
    assert!(key.starts_with("poster_"));
    assert!(key.ends_with(".jpg"));
    assert_eq!(key.len(), "poster_".len() + 32 + ".jpg".len());
}

#[tokio::test]
async fn failed_downloads_keep_the_remote_url() {
    let server = image_host().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_for(dir.path(), &server);

    for name in ["broken.jpg", "empty.jpg"] {
        let url = format!("{}/fanart/{name}", server.uri());
        assert_eq!(cache.store(&url, Some("1")).await, CacheOutcome::Uncached(url.clone()));
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn urls_outside_the_allow_list_are_never_fetched() {
    let server = image_host().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_for(dir.path(), &server);
    let base = server.uri();

    for url in [
        format!("{base}/other/thumb.jpg"),
        format!("{base}/fanart/../other/thumb.jpg"),
        format!("http://user@{}/fanart/movies/603/thumb.jpg", server.address()),
        "https://evil.example/fanart/movies/603/thumb.jpg".to_string(),
        "file:///etc/passwd".to_string(),
    ] {
        assert_eq!(cache.store(&url, Some("603")).await, CacheOutcome::Rejected, "{url}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn redirects_off_the_allow_list_are_not_followed() {
    let server = image_host().await;
    let other = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not-on-allow-list".as_slice()))
        .expect(0)
        .mount(&other)
        .await;
    Mock::given(method("GET"))
        .and(path("/fanart/moved.jpg"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/internal/secret", other.uri()).as_str()),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = cache_for(dir.path(), &server);
    let url = format!("{}/fanart/moved.jpg", server.uri());

    assert_eq!(cache.store(&url, Some("1")).await, CacheOutcome::Uncached(url.clone()));
    assert!(!cache.contains("fanart_1.jpg"));
    assert!(other.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn redirects_within_the_allow_list_are_followed() {
    let server = image_host().await;
    Mock::given(method("GET"))
        .and(path("/fanart/old.jpg"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/fanart/movies/603/thumb.jpg"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = cache_for(dir.path(), &server);
    let url = format!("{}/fanart/old.jpg", server.uri());

    assert_eq!(cache.store(&url, Some("603")).await, CacheOutcome::Cached("fanart_603.jpg".into()));
    let body = std::fs::read(dir.path().join("fanart_603.jpg")).unwrap();
    assert_eq!(body, JPEG);
}

#[tokio::test]
async fn serving_rejects_bad_keys() {
    let dir = tempfile::tempdir().unwrap();
    let cache = ArtworkCache::new(dir.path().join("posters"), Duration::from_secs(1)).unwrap();
    std::fs::write(dir.path().join("secret.jpg"), b"x").unwrap();

    assert_matches!(cache.path_for("../secret.jpg"), Err(Error::Validation(_)));
    assert_matches!(cache.path_for("poster.png"), Err(Error::Validation(_)));
    assert_matches!(cache.path_for("tmdb_1.jpg"), Err(Error::NotFound(_)));
}

#[tokio::test]
async fn enrichment_caches_fanart_and_fills_details_from_tmdb() {
    let server = image_host().await;
    Mock::given(method("GET"))
        .and(path("/movies/603"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "moviethumb": [{
                "url": format!("{}/fanart/movies/603/thumb.jpg", server.uri()),
                "lang": "en", "likes": "3"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/603"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "The Matrix", "release_date": "1999-03-31", "vote_average": 8.2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/603/credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cast": [{"name": "Keanu Reeves"}],
            "crew": [{"name": "Lana Wachowski", "job": "Director"}]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(cache_for(dir.path(), &server));
    let timeout = Duration::from_secs(5);
    let fanart = Arc::new(FanartClient::new(Some("k".into()), "en", server.uri(), timeout).unwrap());
    let tmdb = Arc::new(TmdbClient::new(Some("k".into()), "en", server.uri(), timeout).unwrap());
    let enricher = Enricher::new(fanart as Arc<dyn ArtworkProvider>, tmdb, cache);

    let found = enricher.enrich("The Matrix (1999) {tmdb-603}.mkv").await;
    assert_eq!(found.external_id.as_deref(), Some("603"));
    assert_eq!(
        found.artwork,
        Some(ArtworkRef::Cached {
            key: "fanart_603.jpg".into()
        })
    );
    assert_eq!(found.details.title.as_deref(), Some("The Matrix"));
    assert_eq!(found.details.year, Some(1999));
    assert_eq!(found.credits.directors, ["Lana Wachowski"]);
    assert_eq!(found.credits.cast, ["Keanu Reeves"]);
}

#[tokio::test]
async fn enrichment_without_providers_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(ArtworkCache::new(dir.path(), Duration::from_secs(1)).unwrap());
    let enricher = Enricher::new(offline_tmdb() as Arc<dyn ArtworkProvider>, offline_tmdb(), cache);

    let found = enricher.enrich("The Matrix (1999) {tmdb-603}.mkv").await;
    assert_eq!(found, Default::default());
}

#[tokio::test]
async fn startup_migration_caches_remote_artwork() {
    let server = image_host().await;
    let lib = TestLibrary::with_sources(vec![
        mock_source(&server, "fanart", "/fanart/"),
        AllowedSource::tmdb(),
    ]);
    let file = lib.add_file("The Matrix (1999) {tmdb-603}.mkv");

    let mut record = MediaRecord::new(file.clone(), HdrClassification::hdr10());
    record.external_id = Some("603".into());
    record.artwork = Some(ArtworkRef::Remote {
        url: format!("{}/fanart/movies/603/thumb.jpg", server.uri()),
    });
    lib.registry.commit(record).unwrap();

    let mut broken = MediaRecord::new(lib.add_file("Broken.mkv"), HdrClassification::sdr());
    broken.artwork = Some(ArtworkRef::Remote {
        url: format!("{}/fanart/broken.jpg", server.uri()),
    });
    lib.registry.commit(broken.clone()).unwrap();

    let resolver = lib.resolver();
    assert_eq!(resolver.migrate_remote_artwork().await, 1);

    let migrated = lib.registry.get(&file).unwrap();
    assert_eq!(migrated.artwork_href().as_deref(), Some("/poster/fanart_603.jpg"));
    assert_eq!(lib.registry.get(&broken.path).unwrap(), broken);

    // Nothing left to migrate on the next start.
    assert_eq!(resolver.migrate_remote_artwork().await, 0);
}

#[tokio::test]
async fn forgetting_a_record_evicts_its_artwork() {
    let server = image_host().await;
    let lib = TestLibrary::with_sources(vec![mock_source(&server, "fanart", "/fanart/")]);
    let file = lib.add_file("Film {tmdb-603}.mkv");
    let url = format!("{}/fanart/movies/603/thumb.jpg", server.uri());

    let key = match lib.cache.store(&url, Some("603")).await {
        CacheOutcome::Cached(key) => key,
        other => panic!("unexpected outcome {other:?}"),
    };
    let mut record = MediaRecord::new(file.clone(), HdrClassification::sdr());
    record.artwork = Some(ArtworkRef::Cached { key: key.clone() });
    lib.registry.commit(record).unwrap();

    lib.resolver().forget(&file).unwrap();
    assert!(!lib.cache.contains(&key));
}

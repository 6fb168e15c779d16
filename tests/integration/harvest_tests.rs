//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! harvest cycle end-to-end. Seeds use public-looking host names; the
//! `MockRoute` fetcher rewrites them onto the mock server before the real
//! HTTP fetcher sends the request.

use site_harvest::config::{Config, FetcherConfig, StoreConfig};
use site_harvest::crawler::{
    FetchError, HarvestStage, Harvester, HttpFetcher, LinkError, PageFetcher, SavedPage,
    HOMEPAGE_FILE,
};
use site_harvest::output::load_statistics;
use site_harvest::storage::{open_storage, SqliteStorage, Storage};
use site_harvest::HarvestError;
use std::path::Path;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sends every request to the mock server, keeping path and query
///
/// The served-from URL is mapped back onto the requested host so redirects
/// on the mock server look like redirects on the public site.
struct MockRoute {
    inner: HttpFetcher,
    server: Url,
}

impl MockRoute {
    fn new(server: &MockServer) -> Self {
        Self {
            inner: HttpFetcher::from_config(&test_fetcher_config()).unwrap(),
            server: Url::parse(&server.uri()).unwrap(),
        }
    }
}

impl PageFetcher for MockRoute {
    async fn fetch(
        &self,
        url: &str,
        directory: &Path,
        filename: &str,
    ) -> Result<SavedPage, FetchError> {
        let original = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let mut routed = self.server.clone();
        routed.set_path(original.path());
        routed.set_query(original.query());

        let mut saved = self.inner.fetch(routed.as_str(), directory, filename).await?;
        if let Some(served) = saved.final_url.take() {
            let mut public = original.clone();
            public.set_path(served.path());
            public.set_query(served.query());
            saved.final_url = Some(public);
        }
        Ok(saved)
    }
}

fn test_fetcher_config() -> FetcherConfig {
    FetcherConfig {
        user_agent: "HarvestTest/1.0".to_string(),
        timeout_secs: 5,
        connect_timeout_secs: 2,
        max_concurrent_fetches: 1,
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_records_site_and_resources() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html(
            r#"<html><body>
                <a href="/about.html">About</a>
                <a href="https://www.example.com/news/">News</a>
                <a href="mailto:team@example.com">Mail</a>
            </body></html>"#,
        ),
    )
    .await;
    mount_page(&server, "/about.html", html(&"a".repeat(4 * 1024))).await;
    mount_page(&server, "/news/", html("<p>news</p>")).await;

    let work = tempfile::tempdir().unwrap();
    let db = work.path().join("harvest.db");
    let mut harvester = Harvester::new(MockRoute::new(&server), work.path().join("sites"));

    let report = harvester
        .run("www.example.com", || SqliteStorage::new(&db))
        .await
        .unwrap();

    assert_eq!(harvester.stage(), HarvestStage::Done);
    assert_eq!(report.host, "example.com");
    assert_eq!(report.output_dir, work.path().join("sites/example.com"));
    assert_eq!(report.homepage, report.output_dir.join(HOMEPAGE_FILE));
    assert_eq!(report.links_found, 2);
    assert!(report.failures.is_empty());

    let names: Vec<_> = report
        .downloaded
        .iter()
        .map(|d| d.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["about.html", "default.html"]);
    assert_eq!(report.downloaded[0].size_kb, 4);

    let storage = SqliteStorage::new(&db).unwrap();
    let site = storage.get_site(report.site_id).unwrap();
    assert_eq!(site.host, "example.com");
    assert!(site.is_finalized());
    assert_eq!(site.total_size_kb, Some(report.total_size_kb));
    assert!(site.elapsed_ms.unwrap() >= 0);

    let resources = storage.list_resources(report.site_id).unwrap();
    let urls: Vec<_> = resources.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.example.com/about.html",
            "https://www.example.com/news/"
        ]
    );
}

#[tokio::test]
async fn test_relative_links_follow_homepage_redirect() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        ResponseTemplate::new(301).insert_header("location", "/blog/"),
    )
    .await;
    mount_page(&server, "/blog/", html(r#"<a href="post.html">Post</a>"#)).await;
    mount_page(&server, "/blog/post.html", html("the post")).await;

    let work = tempfile::tempdir().unwrap();
    let db = work.path().join("harvest.db");
    let mut harvester = Harvester::new(MockRoute::new(&server), work.path());

    let report = harvester
        .run("https://example.com", || SqliteStorage::new(&db))
        .await
        .unwrap();

    assert!(
        report.failures.is_empty(),
        "unexpected failures: {:?}",
        report.failures
    );
    assert_eq!(report.downloaded.len(), 1);
    assert_eq!(report.downloaded[0].url, "https://example.com/blog/post.html");
    let content = std::fs::read_to_string(report.output_dir.join("post.html")).unwrap();
    assert_eq!(content, "the post");

    let storage = SqliteStorage::new(&db).unwrap();
    let resources = storage.list_resources(report.site_id).unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].url, "https://example.com/blog/post.html");
}

#[tokio::test]
async fn test_link_failures_are_reported_not_fatal() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html(r#"<a href="/gone">Gone</a><a href="/logo">Logo</a><a href="/ok">Ok</a>"#),
    )
    .await;
    mount_page(&server, "/gone", ResponseTemplate::new(404)).await;
    mount_page(
        &server,
        "/logo",
        ResponseTemplate::new(200)
            .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47])
            .insert_header("content-type", "image/png"),
    )
    .await;
    mount_page(&server, "/ok", html("fine")).await;

    let work = tempfile::tempdir().unwrap();
    let db = work.path().join("harvest.db");
    let mut harvester =
        Harvester::new(MockRoute::new(&server), work.path()).with_max_concurrent(3);

    let report = harvester
        .run("https://example.org", || SqliteStorage::new(&db))
        .await
        .unwrap();

    assert_eq!(report.downloaded.len(), 1);
    assert_eq!(report.downloaded[0].url, "https://example.org/ok");
    assert_eq!(report.failures.len(), 2);
    assert!(matches!(
        report.failures[0].error,
        LinkError::Fetch(FetchError::Status(404))
    ));
    assert!(matches!(
        report.failures[1].error,
        LinkError::Fetch(FetchError::UnsupportedContentType(_))
    ));

    let storage = SqliteStorage::new(&db).unwrap();
    assert_eq!(storage.count_resources(report.site_id).unwrap(), 1);
    assert!(storage.get_site(report.site_id).unwrap().is_finalized());
}

#[tokio::test]
async fn test_homepage_error_leaves_unfinalized_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", ResponseTemplate::new(500)).await;

    let work = tempfile::tempdir().unwrap();
    let db = work.path().join("harvest.db");
    let mut harvester = Harvester::new(MockRoute::new(&server), work.path());

    let result = harvester
        .run("https://example.net", || SqliteStorage::new(&db))
        .await;

    match result {
        Err(HarvestError::Fetch { url, source }) => {
            assert_eq!(url, "https://example.net/");
            assert!(matches!(source, FetchError::Status(500)));
        }
        other => panic!("expected homepage fetch error, got {:?}", other),
    }

    let storage = SqliteStorage::new(&db).unwrap();
    let stats = load_statistics(&storage).unwrap();
    assert_eq!(stats.sites.len(), 1);
    assert_eq!(stats.unfinalized_sites, 1);
    assert_eq!(stats.total_resources, 0);
}

#[tokio::test]
async fn test_rerun_creates_new_site_and_overwrites_files() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html(r#"<a href="/page.html">Page</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(html("first run"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/page.html", html("second")).await;

    let work = tempfile::tempdir().unwrap();
    let db = work.path().join("harvest.db");
    let mut harvester = Harvester::new(MockRoute::new(&server), work.path());

    let first = harvester
        .run("https://example.com", || SqliteStorage::new(&db))
        .await
        .unwrap();
    let second = harvester
        .run("https://example.com", || SqliteStorage::new(&db))
        .await
        .unwrap();

    assert_ne!(first.site_id, second.site_id);
    assert_eq!(first.output_dir, second.output_dir);
    let content = std::fs::read_to_string(second.output_dir.join("page.html")).unwrap();
    assert_eq!(content, "second");

    let storage = SqliteStorage::new(&db).unwrap();
    assert_eq!(storage.list_sites().unwrap().len(), 2);
    assert_eq!(storage.count_resources(first.site_id).unwrap(), 1);
    assert_eq!(storage.count_resources(second.site_id).unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected_through_public_entry_point() {
    let work = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.output.root_dir = work.path().join("out").to_string_lossy().into_owned();
    config.store = StoreConfig {
        connection_string: work.path().join("harvest.db").to_string_lossy().into_owned(),
        ..StoreConfig::default()
    };

    let result = site_harvest::harvest(&config, "http://localhost").await;

    assert!(matches!(result, Err(HarvestError::InvalidSeed { .. })));
    assert!(!work.path().join("out").exists());
    assert!(!work.path().join("harvest.db").exists());
}

#[tokio::test]
async fn test_open_storage_from_config() {
    let work = tempfile::tempdir().unwrap();
    let store = StoreConfig {
        connection_string: format!("sqlite://{}", work.path().join("h.db").display()),
        ..StoreConfig::default()
    };

    let mut storage = open_storage(&store).unwrap();
    let id = storage.create_site("example.com").unwrap();
    drop(storage);

    let reopened = open_storage(&store).unwrap();
    assert_eq!(reopened.get_site(id).unwrap().host, "example.com");
}

//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run complete
//! clones into temporary directories.

use siteclone::config::MirrorConfig;
use siteclone::crawler::clone_site;
use siteclone::output::NoopReporter;
use siteclone::{asset_local_path, page_local_path, CloneSummary};
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration cloning `server` into `out`
fn create_test_config(server: &MockServer, out: &Path) -> MirrorConfig {
    let mut config = MirrorConfig::for_url(format!("{}/", server.uri()));
    config.output.out_dir = out.to_string_lossy().into_owned();
    config.crawler.timeout_ms = 5_000;
    config.crawler.user_agent = "TestBot/1.0".to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

async fn mount_page(server: &MockServer, p: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn run(config: MirrorConfig) -> CloneSummary {
    clone_site(config, Box::new(NoopReporter))
        .await
        .expect("clone should succeed")
}

fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("missing {}: {}", relative, e))
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

#[tokio::test]
async fn test_logo_and_about_scenario() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
           <img src="/img/logo.png"><a href="/about">About</a>
           </body></html>"#,
    )
    .await;
    mount_page(&server, "/about", "<html><head></head><body>About us</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PNG".to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let summary = run(create_test_config(&server, dir.path())).await;

    let logo = asset_local_path(&url(&server, "/img/logo.png"), Some(".png"));
    let index = read(dir.path(), "index.html");
    assert!(index.contains(&format!(r#"src="./{}""#, logo)));
    assert!(index.contains(r#"href="./about.html""#));
    assert!(index.contains(r#"<script id="siteclone-sw">"#));

    assert!(read(dir.path(), "about.html").contains("About us"));
    assert_eq!(std::fs::read(dir.path().join(&logo)).unwrap(), b"PNG");

    let sw = read(dir.path(), "sw.js");
    assert!(sw.contains(&format!(r#"["/about.html","/{}","/index.html"]"#, logo)));

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.pages_written, 2);
    assert_eq!(summary.assets_stored, 1);
    assert_eq!(summary.precached_files, 3);
}

#[tokio::test]
async fn test_page_budget_respected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/p1">1</a><a href="/p2">2</a><a href="/p3">3</a><a href="/p4">4</a>"#,
    )
    .await;
    for p in ["/p1", "/p2", "/p3", "/p4"] {
        mount_page(&server, p, "<html><body>page</body></html>").await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.crawler.max_pages = 2;
    let summary = run(config).await;

    assert_eq!(summary.pages_visited, 2);
    assert!(dir.path().join("index.html").exists());
    assert!(dir.path().join("p1.html").exists());
    assert!(!dir.path().join("p2.html").exists());
}

#[tokio::test]
async fn test_robots_disallow_enforced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&server)
        .await;
    mount_page(&server, "/", r#"<a href="/private/x">secret</a><a href="/open">open</a>"#).await;
    mount_page(&server, "/open", "<p>open</p>").await;
    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let summary = run(create_test_config(&server, dir.path())).await;

    assert_eq!(summary.pages_skipped_robots, 1);
    assert!(dir.path().join("open.html").exists());
    assert!(!dir.path().join("private/x.html").exists());
}

#[tokio::test]
async fn test_robots_allow_overrides_disallow_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\nAllow: /public"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.start_url = format!("{}/public/", server.uri());
    mount_page(&server, "/public/", r#"<a href="/other">other</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html("<p>other</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let summary = run(config).await;
    assert!(dir.path().join("public/index.html").exists());
    assert_eq!(summary.pages_skipped_robots, 1);
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>home</p>").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.crawler.respect_robots = false;
    run(config).await;

    assert!(dir.path().join("index.html").exists());
}

#[tokio::test]
async fn test_query_strings_map_to_distinct_files() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/search?q=a">a</a><a href="/search?q=b">b</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "a"))
        .respond_with(html("<p>results for a</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "b"))
        .respond_with(html("<p>results for b</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    run(create_test_config(&server, dir.path())).await;

    let a = page_local_path(&url(&server, "/search?q=a"));
    let b = page_local_path(&url(&server, "/search?q=b"));
    assert_ne!(a, b);
    assert!(read(dir.path(), &a).contains("results for a"));
    assert!(read(dir.path(), &b).contains("results for b"));

    let index = read(dir.path(), "index.html");
    assert!(index.contains(&format!(r#"href="./{}""#, a)));
    assert!(index.contains(&format!(r#"href="./{}""#, b)));
}

#[tokio::test]
async fn test_cross_origin_untouched_and_never_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("nope"))
        .expect(0)
        .mount(&other)
        .await;

    let pic = format!("{}/pic.png", other.uri());
    let link = format!("{}/elsewhere", other.uri());
    mount_page(
        &server,
        "/",
        &format!(r#"<img src="{}"><a href="{}">Elsewhere</a>"#, pic, link),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let summary = run(create_test_config(&server, dir.path())).await;

    let index = read(dir.path(), "index.html");
    assert!(index.contains(&format!(r#"src="{}""#, pic)));
    assert!(index.contains(&format!(r#"href="{}""#, link)));
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.assets_stored, 0);
}

#[tokio::test]
async fn test_shared_asset_fetched_once_across_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><link rel="stylesheet" href="/shared.css"></head>
           <body><a href="/docs/guide/">Guide</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/docs/guide/",
        r#"<html><head><link rel="stylesheet" href="/shared.css"></head><body></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/shared.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"body{}".to_vec(), "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    run(create_test_config(&server, dir.path())).await;

    let css = asset_local_path(&url(&server, "/shared.css"), Some(".css"));
    assert!(read(dir.path(), "index.html").contains(&format!(r#"href="./{}""#, css)));
    assert!(read(dir.path(), "docs/guide/index.html").contains(&format!(r#"href="../../{}""#, css)));
}

#[tokio::test]
async fn test_non_html_page_stored_and_linked() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/files/report.pdf">Report</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let summary = run(create_test_config(&server, dir.path())).await;

    let asset = asset_local_path(&url(&server, "/files/report.pdf"), Some(".pdf"));
    assert_eq!(std::fs::read(dir.path().join(&asset)).unwrap(), b"%PDF");
    assert_eq!(std::fs::read(dir.path().join("files/report.pdf")).unwrap(), b"%PDF");
    assert!(read(dir.path(), "index.html").contains(r#"href="./files/report.pdf""#));
    assert_eq!(summary.pages_written, 1);
    assert_eq!(summary.assets_stored, 1);
}

#[tokio::test]
async fn test_redirect_resolves_against_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    mount_page(&server, "/new/", r#"<img src="pic.png">"#).await;
    Mock::given(method("GET"))
        .and(path("/new/pic.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PNG".to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.start_url = format!("{}/old", server.uri());
    run(config).await;

    let pic = asset_local_path(&url(&server, "/new/pic.png"), Some(".png"));
    assert!(read(dir.path(), "old.html").contains(&format!(r#"src="./{}""#, pic)));
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/gone">Gone</a><a href="/ok">OK</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<p>ok</p>").await;

    let dir = TempDir::new().unwrap();
    let summary = run(create_test_config(&server, dir.path())).await;

    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.pages_failed, 1);
    assert!(dir.path().join("ok.html").exists());
    assert!(!dir.path().join("gone.html").exists());
}

#[tokio::test]
async fn test_rerun_is_deterministic() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head></head><body><img src="/a.png"><a href="/b">B</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/b", "<html><head></head><body>b</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"A".to_vec(), "image/png"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    run(create_test_config(&server, dir.path())).await;
    let first_index = read(dir.path(), "index.html");
    let first_sw = read(dir.path(), "sw.js");

    run(create_test_config(&server, dir.path())).await;
    assert_eq!(read(dir.path(), "index.html"), first_index);
    assert_eq!(read(dir.path(), "sw.js"), first_sw);
    assert_eq!(first_index.matches("siteclone-sw").count(), 1);
}

#[tokio::test]
async fn test_stylesheet_image_shared_with_page_is_localized() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><link rel="stylesheet" href="/css/site.css"></head>
           <body><img src="/img/bg.png"></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/css/site.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"body{background:url(../img/bg.png)}".to_vec(), "text/css"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/bg.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"PNG".to_vec(), "image/png")
                .set_delay(std::time::Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    run(create_test_config(&server, dir.path())).await;

    let css = asset_local_path(&url(&server, "/css/site.css"), Some(".css"));
    let bg = asset_local_path(&url(&server, "/img/bg.png"), Some(".png"));
    let bg_file = bg.trim_start_matches("assets/");
    assert_eq!(
        read(dir.path(), &css),
        format!("body{{background:url(\"./{}\")}}", bg_file)
    );
    assert!(read(dir.path(), "index.html").contains(&format!(r#"src="./{}""#, bg)));
}

#[tokio::test]
async fn test_reserved_characters_in_page_names_stay_linkable() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a%3Fb">Odd</a>"#).await;
    mount_page(&server, "/a%3Fb", "<p>odd name</p>").await;

    let dir = TempDir::new().unwrap();
    run(create_test_config(&server, dir.path())).await;

    assert!(read(dir.path(), "a?b.html").contains("odd name"));
    assert!(read(dir.path(), "index.html").contains(r#"href="./a%3Fb.html""#));
    assert!(read(dir.path(), "sw.js").contains(r#""/a%3Fb.html""#));
    assert_eq!(
        siteclone::server::resolve_file(dir.path(), "/a%3Fb.html"),
        Some(dir.path().join("a?b.html"))
    );
}

#[tokio::test]
async fn test_latin1_page_bytes_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><head><meta charset=\"iso-8859-1\"></head><body><p>caf\xe9</p></body></html>"
                .to_vec(),
            "text/html; charset=iso-8859-1",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    run(create_test_config(&server, dir.path())).await;

    let bytes = std::fs::read(dir.path().join("index.html")).unwrap();
    assert!(bytes.windows(8).any(|w| w == b"<p>caf\xe9<"));
    assert!(!bytes.windows(3).any(|w| w == "\u{fffd}".as_bytes()));
    assert!(bytes.windows(b"siteclone-sw".len()).any(|w| w == b"siteclone-sw"));
}

//! Integration tests for the output tree and preview server

use siteclone::config::MirrorConfig;
use siteclone::crawler::clone_site;
use siteclone::output::NoopReporter;
use siteclone::server::serve_with_shutdown;
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_clone_then_preview() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            br#"<html><head></head><body><a href="/about">About</a></body></html>"#.to_vec(),
            "text/html",
        ))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<html><body>About us</body></html>".to_vec(), "text/html"),
        )
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = MirrorConfig::for_url(format!("{}/", site.uri()));
    config.output.out_dir = dir.path().to_string_lossy().into_owned();
    clone_site(config, Box::new(NoopReporter)).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_shutdown(
        listener,
        dir.path().to_path_buf(),
        async {
            let _ = rx.await;
        },
    ));

    let index = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(index.status(), 200);
    assert!(index.text().await.unwrap().contains("./about.html"));

    let about = reqwest::get(format!("http://{}/about", addr)).await.unwrap();
    assert!(about.text().await.unwrap().contains("About us"));

    let sw = reqwest::get(format!("http://{}/sw.js", addr)).await.unwrap();
    let content_type = sw.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.contains("javascript"));
    assert!(sw.text().await.unwrap().contains("siteclone-precache-v1"));

    let escape = reqwest::get(format!("http://{}/..%2F..%2Fetc%2Fpasswd", addr))
        .await
        .unwrap();
    assert_eq!(escape.status(), 404);

    tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

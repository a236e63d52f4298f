mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use subfile_proxy::{ProxyToken, create_router};

use common::{ZipFixture, test_resolver};

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, content_type, body)
}

fn proxy_path(url: String, season: Option<u32>, episode: Option<u32>) -> String {
    ProxyToken::new(url, season, episode).unwrap().proxy_path().unwrap()
}

#[tokio::test]
async fn serves_the_matching_entry_of_a_season_pack() {
    let server = MockServer::start().await;
    let zip = ZipFixture::new()
        .deflated("Show.S02E01.srt", b"first episode")
        .deflated("Show.S02E02.srt", b"second episode")
        .stored("info.nfo", b"nfo")
        .build();
    Mock::given(method("GET"))
        .and(path("/pack.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_router(test_resolver());
    let uri = proxy_path(format!("{}/pack.zip", server.uri()), Some(2), Some(2));
    let (status, content_type, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/x-subrip; charset=utf-8"));
    assert_eq!(body, b"second episode");
}

#[tokio::test]
async fn serves_the_matching_entry_of_a_rar_pack() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(include_bytes!("fixtures/season_pack_v5.rar").to_vec()),
        )
        .mount(&server)
        .await;

    let app = create_router(test_resolver());
    let uri = proxy_path(format!("{}/download", server.uri()), Some(1), Some(2));
    let (status, _, body) = get(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.ends_with(b"second\n"));
}

#[tokio::test]
async fn plain_subtitles_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie.srt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain body"))
        .mount(&server)
        .await;

    let app = create_router(test_resolver());
    let (status, _, body) = get(app, &proxy_path(format!("{}/movie.srt", server.uri()), None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"plain body");
}

#[tokio::test]
async fn failures_collapse_into_a_generic_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/empty.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(ZipFixture::new().stored("readme.txt", b"hi").build()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.rar"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uris = [
        proxy_path(format!("{}/empty.zip", server.uri()), None, None),
        proxy_path(format!("{}/gone.rar", server.uri()), Some(1), Some(1)),
        "/subfile/bm90LWpzb24.srt".to_string(),
    ];

    for uri in uris {
        let (status, content_type, body) = get(create_router(test_resolver()), &uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert!(content_type.unwrap().starts_with("application/json"));

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "err": "failed to extract subtitle from archive" }));
    }
}

#[tokio::test]
async fn other_paths_are_not_found() {
    for uri in ["/", "/subfile/abc.vtt", "/subfile/a.b.srt", "/manifest.json"] {
        let (status, _, body) = get(create_router(test_resolver()), uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["err"], "not found");
    }
}

#[tokio::test]
async fn concurrent_identical_requests_download_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pack.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(ZipFixture::new().stored("Show.S01E01.srt", b"shared").build())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = create_router(test_resolver());
    let uri = proxy_path(format!("{}/pack.zip", server.uri()), Some(1), Some(1));

    let (a, b) = tokio::join!(get(app.clone(), &uri), get(app, &uri));
    assert_eq!((a.0, b.0), (StatusCode::OK, StatusCode::OK));
    assert_eq!(a.2, b"shared");
    assert_eq!(b.2, b"shared");
}

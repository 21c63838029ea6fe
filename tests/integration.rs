//! Integration tests against local HTTP servers.
//!
//! Run with: `cargo test --test integration`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vod_search::{
    Aggregator, CatalogClient, Endpoint, Fetcher, HttpFetcher, ProxySettings, RetryPolicy,
    SearchError, Settings, VideoSource,
};

const API_PATH: &str = "/api.php/provide/vod";

fn list_body(items: &[(&str, &str)]) -> serde_json::Value {
    let list: Vec<_> = items
        .iter()
        .map(|(id, name)| json!({ "vod_id": id, "vod_name": name, "vod_pic": "" }))
        .collect();
    json!({ "code": 1, "msg": "数据列表", "page": 1, "pagecount": 1, "total": items.len(), "list": list })
}

fn client(settings: Settings, endpoint: Endpoint) -> CatalogClient {
    CatalogClient::from_settings(settings, endpoint).unwrap()
}

mod fetcher_tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_endpoint_is_attempted_three_times() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("vod-search-test").unwrap();
        let result = fetcher
            .fetch(
                &format!("{}/slow", server.uri()),
                RetryPolicy::new(Duration::from_millis(100), 2),
            )
            .await;

        assert!(matches!(result, Err(SearchError::Timeout)));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_error_status_is_returned_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"error":"upstream down"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("vod-search-test").unwrap();
        let response = fetcher
            .fetch(&format!("{}/broken", server.uri()), RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(response.status, 500);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let fetcher = HttpFetcher::new("vod-search-test").unwrap();
        let err = fetcher
            .fetch(
                "http://127.0.0.1:9/unreachable",
                RetryPolicy::new(Duration::from_millis(500), 1),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), vod_search::ErrorKind::Transport);
    }
}

mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_search_and_cached_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("wd", "流浪地球"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&[("1", "流浪地球"), ("2", "流浪地球2")])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("ac", "detail"))
            .and(query_param("ids", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 1,
                "list": [{
                    "vod_id": 2,
                    "vod_name": "流浪地球2",
                    "vod_pic": "http://img.example/2.jpg",
                    "vod_play_url": "正片$http://cdn.example/2.m3u8"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = VideoSource::new("local", "Local", format!("{}{}", server.uri(), API_PATH));
        let client = client(Settings::new(), Endpoint::Direct);

        let page = client.search_videos(&source, "流浪地球", 1).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.list[1].source_id.as_deref(), Some("local"));

        let first = client.get_video_detail(&source, "2").await.unwrap();
        let second = client.get_video_detail(&source, "2").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.cover(), Some("http://img.example/2.jpg"));

        let episodes = vod_search::parse_play_url(first.vod_play_url.as_deref().unwrap());
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].label, "正片");
    }

    #[tokio::test]
    async fn test_relay_endpoint() {
        let server = MockServer::start().await;
        let upstream = "https://catalog.example/api.php/provide/vod";
        Mock::given(method("GET"))
            .and(path("/api/proxy"))
            .and(query_param("apiUrl", upstream))
            .and(query_param("wd", "hero"))
            .and(query_param("pg", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&[("7", "Hero")])))
            .expect(1)
            .mount(&server)
            .await;

        let source = VideoSource::new("remote", "Remote", upstream);
        let client = client(Settings::new(), Endpoint::relay(&server.uri()).unwrap());

        let page = client.search_videos(&source, "hero", 2).await.unwrap();
        assert_eq!(page.list[0].vod_name, "Hero");
    }

    #[tokio::test]
    async fn test_relay_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/proxy"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "error": "bad gateway" })))
            .mount(&server)
            .await;

        let source = VideoSource::new("remote", "Remote", "https://catalog.example/api");
        let client = client(Settings::new(), Endpoint::relay(&server.uri()).unwrap());

        let err = client.search_videos(&source, "x", 1).await.unwrap_err();
        assert!(matches!(err, SearchError::Status(502)));
    }

    #[tokio::test]
    async fn test_direct_through_acceleration_relay() {
        let server = MockServer::start().await;
        let upstream = "https://catalog.example/api.php/provide/vod";
        Mock::given(method("GET"))
            .and(path("/accel/"))
            .and(query_param("url", format!("{}?wd=hero&pg=1", upstream)))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&[("1", "Hero")])))
            .expect(1)
            .mount(&server)
            .await;

        let settings = Settings::new()
            .with_proxy_settings(ProxySettings::enabled(format!("{}/accel", server.uri())));
        let source = VideoSource::new("remote", "Remote", upstream);
        let client = client(settings, Endpoint::Direct);

        let page = client.search_videos(&source, "hero", 1).await.unwrap();
        assert_eq!(page.list.len(), 1);
    }
}

mod aggregation_tests {
    use super::*;

    #[tokio::test]
    async fn test_aggregated_search_isolates_failing_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&[("1", "One"), ("2", "Two")])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "msg": "closed" })))
            .mount(&server)
            .await;

        let sources = vec![
            VideoSource::new("good", "Good", format!("{}/good", server.uri())),
            VideoSource::new("bad", "Bad", format!("{}/bad", server.uri())),
        ];
        let aggregator = Aggregator::new(Arc::new(client(Settings::new(), Endpoint::Direct)));
        let batches = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&batches);

        let results = aggregator
            .aggregated_search(
                &sources,
                "q",
                move |batch| sink.lock().unwrap().push(batch.len()),
                None,
                1,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(*batches.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_search_videos_all_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&[("1", "One")])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(list_body(&[("1", "Uno"), ("2", "Dos")])))
            .mount(&server)
            .await;

        let sources = vec![
            VideoSource::new("a", "A", format!("{}/a", server.uri())),
            VideoSource::new("b", "B", format!("{}/b", server.uri())),
            VideoSource::new("empty", "Empty", ""),
        ];
        let client = client(Settings::new(), Endpoint::Direct);

        let page = client.search_videos_all(&sources, "q", 1).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.list.len(), 3);
    }

    #[tokio::test]
    async fn test_cover_batch_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(API_PATH))
            .and(query_param("ids", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 1,
                "list": [{ "vod_id": 5, "vod_name": "Five", "vod_pic": "http://img.example/5.jpg" }]
            })))
            .mount(&server)
            .await;

        let source = VideoSource::new("local", "Local", format!("{}{}", server.uri(), API_PATH));
        let client = client(Settings::new(), Endpoint::Direct);
        let videos = vec![vod_search::VideoItem::new("5", "Five").with_source("local", "Local")];

        let covers = client.batch_get_video_covers(&videos, &[source]).await;
        assert_eq!(covers.get("5").map(String::as_str), Some("http://img.example/5.jpg"));
    }
}

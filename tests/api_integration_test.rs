use anyhow::Result;
use httpmock::prelude::*;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tiktok_profile_api::adapters::server;
use tiktok_profile_api::{build_service, ServiceConfig};

const PROFILE_PAGE: &str = r#"<!DOCTYPE html><html><head><title>foo</title></head><body>
<script id="__UNIVERSAL_DATA_FOR_REHYDRATION__" type="application/json">{"UserModule":{"users":{"foo":{"id":"123","shortId":"","uniqueId":"foo","nickname":"Foo","signature":"hello","avatarLarger":"https:\/\/p16-sign-va.tiktokcdn.com\/a.jpeg","verified":true,"privateAccount":false,"createTime":1600000000,"commentSetting":0,"duetSetting":3}},"stats":{"foo":{"followerCount":1500,"followingCount":12,"heartCount":2500000,"videoCount":42}}}}</script>
</body></html>"#;

const FALLBACK_PAGE: &str = r#"<html><body><script>window.__DATA__ = {"items":[{"author":{"id":"555","shortId":"","uniqueId":"bar","nickname":"Bar","signature":"fallback","verified":false}}]};</script></body></html>"#;

struct TestEnv {
    _dirs: (TempDir, TempDir),
    base: String,
    client: reqwest::Client,
}

impl TestEnv {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json(&self, path: &str) -> Result<(u16, reqwest::header::HeaderMap, Value)> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.json::<Value>().await?;
        Ok((status, headers, body))
    }
}

/// 啟動指向 mock 站點的 API 伺服器
async fn start_api(remote_base_url: String, max_requests: u64) -> Result<TestEnv> {
    let cache_dir = TempDir::new()?;
    let limit_dir = TempDir::new()?;

    let mut config = ServiceConfig::default();
    config.fetch.base_url = remote_base_url;
    config.fetch.timeout_seconds = 5;
    config.fetch.connect_timeout_seconds = 2;
    config.cache.directory = cache_dir.path().to_path_buf();
    config.rate_limit.directory = limit_dir.path().to_path_buf();
    config.rate_limit.max_requests = max_requests;

    let service = Arc::new(build_service(config)?);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let app = server::router(service).into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestEnv {
        _dirs: (cache_dir, limit_dir),
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
    })
}

#[tokio::test]
async fn test_profile_lookup_then_cache_hit() -> Result<()> {
    let remote = MockServer::start();
    let page_mock = remote.mock(|when, then| {
        when.method(GET).path("/@foo");
        then.status(200)
            .header("content-type", "text/html")
            .body(PROFILE_PAGE);
    });

    let env = start_api(remote.base_url(), 30).await?;

    let (status, headers, body) = env.get_json("/?username=@foo").await?;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body.get("cached").is_none());
    assert_eq!(body["data"]["profile"]["uid"], "123");
    assert_eq!(body["data"]["profile"]["uniqueid"], "foo");
    assert_eq!(body["data"]["profile"]["profile-url"], "https://www.tiktok.com/@foo");
    assert_eq!(body["data"]["profile"]["verified"], true);
    assert_eq!(body["data"]["stats"]["follower-count"], 1500);
    assert_eq!(body["data"]["stats"]["formatted"]["follower-count"], "1.5K");
    assert_eq!(body["data"]["stats"]["formatted"]["heart-count"], "2.5M");
    assert_eq!(body["data"]["account"]["create-time"], "2020-09-13 12:26:40");
    assert_eq!(body["data"]["settings"]["comment-setting"], "everyone allowed");
    assert_eq!(body["data"]["settings"]["duet-setting"], "private");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");

    // 第二次走快取，不再打到遠端
    let (status, _, body) = env
        .get_json("/profile?username=https://www.tiktok.com/@foo")
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["cached"], true);
    assert_eq!(body["data"]["profile"]["uid"], "123");

    page_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_fallback_strategy_page() -> Result<()> {
    let remote = MockServer::start();
    remote.mock(|when, then| {
        when.method(GET).path("/@bar");
        then.status(200).body(FALLBACK_PAGE);
    });

    let env = start_api(remote.base_url(), 30).await?;

    let (status, _, body) = env.get_json("/?username=bar").await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["profile"]["uid"], "555");
    assert_eq!(body["data"]["profile"]["signature"], "fallback");
    assert_eq!(body["data"]["stats"]["follower-count"], 0);
    assert_eq!(body["data"]["stats"]["formatted"]["follower-count"], "0");
    Ok(())
}

#[tokio::test]
async fn test_request_errors_map_to_status_codes() -> Result<()> {
    let remote = MockServer::start();
    remote.mock(|when, then| {
        when.method(GET).path("/@ghost");
        then.status(404);
    });
    remote.mock(|when, then| {
        when.method(GET).path("/@changed");
        then.status(200).body("<html><body>nothing here</body></html>");
    });

    let env = start_api(remote.base_url(), 30).await?;

    let (status, _, body) = env.get_json("/").await?;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("missing"));
    assert!(body.get("data").is_none());

    let (status, headers, body) = env.get_json("/?username=a&username=b").await?;
    assert_eq!(status, 400);
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "The username parameter is missing");

    let (status, _, _) = env.get_json("/?username=bad%20name!").await?;
    assert_eq!(status, 400);

    let (status, _, body) = env.get_json("/?username=ghost").await?;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "The user does not exist");

    let (status, _, body) = env.get_json("/?username=changed").await?;
    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn test_method_handling() -> Result<()> {
    let remote = MockServer::start();
    let env = start_api(remote.base_url(), 30).await?;

    let response = env.client.post(env.url("/?username=foo")).send().await?;
    assert_eq!(response.status().as_u16(), 405);
    let body = response.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Only the GET method is supported");

    let response = env
        .client
        .request(reqwest::Method::OPTIONS, env.url("/"))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 204);

    let (status, _, body) = env.get_json("/health").await?;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_per_client() -> Result<()> {
    let remote = MockServer::start();
    remote.mock(|when, then| {
        when.method(GET).path("/@foo");
        then.status(200).body(PROFILE_PAGE);
    });

    let env = start_api(remote.base_url(), 2).await?;

    for _ in 0..2 {
        let response = env
            .client
            .get(env.url("/?username=foo"))
            .header("x-forwarded-for", "203.0.113.5")
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = env
        .client
        .get(env.url("/?username=foo"))
        .header("x-forwarded-for", "203.0.113.5")
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 429);
    assert_eq!(response.headers()["retry-after"], "60");
    let body = response.json::<Value>().await?;
    assert_eq!(body["success"], false);

    // 另一個用戶端不受影響
    let response = env
        .client
        .get(env.url("/?username=foo"))
        .header("x-forwarded-for", "203.0.113.6")
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    Ok(())
}

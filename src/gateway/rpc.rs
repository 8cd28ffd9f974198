use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FeedError;
use crate::model::{EntryKey, EntryKind, FeedEntry, LikeState, SaveState};
use crate::normalize;

use super::FeedGateway;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const FN_FEED: &str = "get_feed_entries";
const FN_VIEW: &str = "increment_announcement_view";

fn like_fn(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Post => "toggle_post_like",
        EntryKind::Announcement => "toggle_announcement_like",
    }
}

fn favorite_fn(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Post => "toggle_post_favorite",
        EntryKind::Announcement => "toggle_announcement_favorite",
    }
}

#[derive(Clone, Debug)]
pub struct RpcGatewayConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    /// Session token; falls back to `api_key` for the bearer header.
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl RpcGatewayConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            access_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = get("FEED_API_URL").context("FEED_API_URL is not set")?;
        let base_url = Url::parse(&raw).with_context(|| format!("invalid FEED_API_URL: {raw}"))?;
        let mut cfg = Self::new(base_url);
        cfg.api_key = get("FEED_API_KEY");
        cfg.access_token = get("FEED_ACCESS_TOKEN");
        if let Some(secs) = get("FEED_HTTP_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            cfg.timeout = Duration::from_secs(secs);
        }
        Ok(cfg)
    }
}

#[derive(Serialize)]
struct FeedArgs {
    p_profile_id: i64,
    p_limit: usize,
    p_offset: usize,
}

#[derive(Serialize)]
struct ToggleArgs {
    p_entry_id: i64,
    p_profile_id: i64,
}

#[derive(Serialize)]
struct ViewArgs {
    p_entry_id: i64,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// PostgREST-style RPC client: `POST {base}/rest/v1/rpc/{function}` with a
/// JSON object of named arguments.
#[derive(Clone)]
pub struct RpcGateway {
    http: HttpClient,
    cfg: RpcGatewayConfig,
}

impl RpcGateway {
    pub fn new(cfg: RpcGatewayConfig) -> Result<Self, FeedError> {
        let http = HttpClient::builder().timeout(cfg.timeout).build()?;
        Ok(Self { http, cfg })
    }

    fn endpoint(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.cfg.base_url.as_str().trim_end_matches('/'), function)
    }

    async fn call<A: Serialize + Sync>(
        &self,
        function: &str,
        args: &A,
    ) -> Result<Bytes, FeedError> {
        let mut req = self.http.post(self.endpoint(function)).json(args);
        if let Some(key) = &self.cfg.api_key {
            req = req.header("apikey", key);
        }
        if let Some(token) = self.cfg.access_token.as_ref().or(self.cfg.api_key.as_ref()) {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .map(|b| b.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            tracing::debug!(function, status = status.as_u16(), "rpc failed");
            return Err(FeedError::Backend { status: status.as_u16(), message });
        }
        Ok(bytes)
    }
}

#[async_trait]
impl FeedGateway for RpcGateway {
    async fn fetch_page(
        &self,
        profile_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FeedEntry>, FeedError> {
        let args = FeedArgs { p_profile_id: profile_id, p_limit: limit, p_offset: offset };
        let bytes = self.call(FN_FEED, &args).await?;
        normalize::decode_page(&bytes)
    }

    async fn toggle_like(&self, entry: EntryKey, profile_id: i64) -> Result<LikeState, FeedError> {
        let function = like_fn(entry.kind);
        let args = ToggleArgs { p_entry_id: entry.id, p_profile_id: profile_id };
        let bytes = self.call(function, &args).await?;
        normalize::decode_like_result(&bytes, function)
    }

    async fn toggle_favorite(
        &self,
        entry: EntryKey,
        profile_id: i64,
    ) -> Result<SaveState, FeedError> {
        let function = favorite_fn(entry.kind);
        let args = ToggleArgs { p_entry_id: entry.id, p_profile_id: profile_id };
        let bytes = self.call(function, &args).await?;
        normalize::decode_save_result(&bytes, function)
    }

    async fn record_announcement_view(&self, entry_id: i64) -> Result<(), FeedError> {
        self.call(FN_VIEW, &ViewArgs { p_entry_id: entry_id }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn gateway(server: &MockServer) -> RpcGateway {
        let mut cfg = RpcGatewayConfig::new(Url::parse(&server.base_url()).unwrap());
        cfg.api_key = Some("anon-key".into());
        RpcGateway::new(cfg).unwrap()
    }

    #[test]
    fn config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("FEED_API_URL", "https://demo.example.com/"),
            ("FEED_API_KEY", "anon"),
            ("FEED_HTTP_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();
        let cfg = RpcGatewayConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.base_url.as_str(), "https://demo.example.com/");
        assert_eq!(cfg.api_key.as_deref(), Some("anon"));
        assert_eq!(cfg.access_token, None);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
    }

    #[test]
    fn config_requires_a_valid_url() {
        let err = RpcGatewayConfig::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("FEED_API_URL"));

        let err = RpcGatewayConfig::from_lookup(|_| Some("not a url".into())).unwrap_err();
        assert!(err.to_string().contains("invalid FEED_API_URL"));
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let cfg = RpcGatewayConfig::new(Url::parse("https://demo.example.com/").unwrap());
        let gw = RpcGateway::new(cfg).unwrap();
        assert_eq!(gw.endpoint(FN_FEED), "https://demo.example.com/rest/v1/rpc/get_feed_entries");
    }

    #[tokio::test]
    async fn fetch_page_posts_named_args_and_decodes_rows() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rest/v1/rpc/get_feed_entries")
                    .header("apikey", "anon-key")
                    .header("authorization", "Bearer anon-key")
                    .json_body(json!({"p_profile_id": 7, "p_limit": 20, "p_offset": 40}));
                then.status(200).json_body(json!([{
                    "kind": "post",
                    "id": 1,
                    "author_profile_id": 3,
                    "author_name": "Ada",
                    "body": "hello",
                    "published_at": "2024-01-15T12:30:45",
                    "resources": {},
                    "is_followed_author": false,
                    "is_favorited": false,
                    "is_promoted": false
                }]));
            })
            .await;

        let entries = gateway(&server).fetch_page(7, 20, 40).await.unwrap();
        mock.assert_async().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].resources.is_empty());
    }

    #[tokio::test]
    async fn toggle_routes_by_entry_kind() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rest/v1/rpc/toggle_announcement_like")
                    .json_body(json!({"p_entry_id": 12, "p_profile_id": 7}));
                then.status(200).json_body(json!([{"liked_now": true, "total_likes": 3}]));
            })
            .await;

        let state = gateway(&server).toggle_like(EntryKey::announcement(12), 7).await.unwrap();
        mock.assert_async().await;
        assert_eq!(state, LikeState { liked_now: true, total_likes: 3 });
    }

    #[tokio::test]
    async fn empty_toggle_result_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/rest/v1/rpc/toggle_post_favorite");
                then.status(200).json_body(json!([]));
            })
            .await;

        let err = gateway(&server).toggle_favorite(EntryKey::post(5), 7).await.unwrap_err();
        assert!(matches!(err, FeedError::NotFound("toggle_post_favorite")));
    }

    #[tokio::test]
    async fn backend_error_carries_status_and_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/rest/v1/rpc/increment_announcement_view");
                then.status(503).json_body(json!({"message": "database unavailable"}));
            })
            .await;

        let err = gateway(&server).record_announcement_view(1).await.unwrap_err();
        match err {
            FeedError::Backend { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let cfg = RpcGatewayConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let gw = RpcGateway::new(cfg).unwrap();
        let err = gw.fetch_page(7, 20, 0).await.unwrap_err();
        assert!(matches!(err, FeedError::Transport(_)));
    }
}

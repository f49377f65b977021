//! XRPC 查询客户端
//!
//! 只实现本项目用到的两个 query：
//! - `com.atproto.repo.getRecord`（发往 record 所在的 PDS）
//! - `app.bsky.actor.getProfile`（发往 AppView）

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::{ResolveError, ResolveResult};
use super::uri::CanonicalUri;

/// 默认公共 AppView
pub const DEFAULT_APPVIEW_URL: &str = "https://public.api.bsky.app";

/// 默认超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// XRPC 错误响应体
#[derive(Debug, Deserialize)]
struct XrpcErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

/// `com.atproto.repo.getRecord` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct RecordResponse {
    pub uri: String,
    #[serde(default)]
    pub cid: Option<String>,
    pub value: serde_json::Value,
}

/// 创建带超时的 HTTP 客户端
pub fn build_http_client(timeout_secs: u64) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("mention-relay/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// XRPC 客户端（无状态，service 按调用传入）
#[derive(Debug, Clone)]
pub struct XrpcClient {
    client: Client,
}

impl XrpcClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 发起一次 XRPC query
    pub async fn query<T: DeserializeOwned>(
        &self,
        service: &str,
        nsid: &str,
        params: &[(&str, &str)],
    ) -> ResolveResult<T> {
        let url = format!("{}/xrpc/{}", service.trim_end_matches('/'), nsid);
        debug!(url = %url, "XRPC query");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(parse_error_body(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// 从 PDS 获取 record
    pub async fn get_record(&self, service: &str, uri: &CanonicalUri) -> ResolveResult<RecordResponse> {
        self.query(
            service,
            "com.atproto.repo.getRecord",
            &[
                ("repo", uri.repo.as_str()),
                ("collection", uri.collection.as_str()),
                ("rkey", uri.rkey.as_str()),
            ],
        )
        .await
    }
}

/// 将非 2xx 响应转为 `ResolveError`
fn parse_error_body(status: u16, body: &str) -> ResolveError {
    match serde_json::from_str::<XrpcErrorBody>(body) {
        Ok(err) => ResolveError::Xrpc {
            error: err.error,
            message: err.message,
        },
        Err(_) => ResolveError::Http(format!("status {}", status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_body_structured() {
        let err = parse_error_body(
            400,
            r#"{"error":"RecordNotFound","message":"Could not locate record"}"#,
        );
        assert_eq!(
            err,
            ResolveError::Xrpc {
                error: "RecordNotFound".to_string(),
                message: Some("Could not locate record".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_error_body_unstructured() {
        let err = parse_error_body(502, "<html>Bad Gateway</html>");
        assert_eq!(err, ResolveError::Http("status 502".to_string()));
    }

    #[test]
    fn test_record_response_decodes() {
        let resp: RecordResponse = serde_json::from_str(
            r#"{"uri":"at://did:plc:abc/sh.tangled.repo/3k","cid":"bafy","value":{"name":"widgets"}}"#,
        )
        .unwrap();
        assert_eq!(resp.value["name"], "widgets");
        assert_eq!(resp.cid.as_deref(), Some("bafy"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(DEFAULT_TIMEOUT_SECS).is_ok());
    }
}

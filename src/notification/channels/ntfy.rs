//! ntfy 渠道
//!
//! 一条通知对应一次 POST：元数据放在请求头，正文放在 body。
//!
//! | Header   | 内容            |
//! |----------|-----------------|
//! | Title    | 标题            |
//! | Icon     | 作者头像 URL    |
//! | Priority | 1-5             |
//! | Click    | 跳转链接        |
//! | Attach   | 附件图片 URL    |

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::notification::channel::{NotificationChannel, SendResult};
use crate::notification::payload::NotificationPayload;

/// 默认推送地址
pub const DEFAULT_NTFY_URL: &str = "http://0.0.0.0";

/// ntfy 渠道配置
#[derive(Debug, Clone)]
pub struct NtfyConfig {
    /// 推送地址（含 topic）
    pub url: String,
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_NTFY_URL.to_string(),
        }
    }
}

/// 组装请求头，空值省略
pub fn headers_for(payload: &NotificationPayload) -> Vec<(&'static str, String)> {
    let mut headers = vec![("Priority", payload.priority.header_value())];

    let optional = [
        ("Title", Some(payload.title.as_str())),
        ("Icon", payload.icon.as_deref()),
        ("Click", Some(payload.url.as_str())),
        ("Attach", payload.picture.as_deref()),
    ];
    for (name, value) in optional {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            headers.push((name, value.to_string()));
        }
    }

    headers
}

/// ntfy 渠道
pub struct NtfyChannel {
    client: Client,
    config: NtfyConfig,
}

impl NtfyChannel {
    pub fn new(client: Client, config: NtfyConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl NotificationChannel for NtfyChannel {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<SendResult> {
        let mut request = self.client.post(&self.config.url);
        for (name, value) in headers_for(payload) {
            request = request.header(name, value);
        }

        let response = request.body(payload.message.clone()).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(channel = "ntfy", status = %status, "Notification accepted");
            Ok(SendResult::Sent)
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok(SendResult::Failed(format!("{}: {}", status, body.trim())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::priority::Priority;

    #[test]
    fn test_headers_full() {
        let payload = NotificationPayload::new("Tangled", "alice starred widgets", "https://tangled.sh/@did:plc:a")
            .with_icon(Some("https://cdn/a.jpg".to_string()))
            .with_priority(Priority::Low)
            .with_picture("https://cdn/p.png");

        let headers = headers_for(&payload);
        assert_eq!(
            headers,
            vec![
                ("Priority", "2".to_string()),
                ("Title", "Tangled".to_string()),
                ("Icon", "https://cdn/a.jpg".to_string()),
                ("Click", "https://tangled.sh/@did:plc:a".to_string()),
                ("Attach", "https://cdn/p.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_headers_omit_missing() {
        let payload = NotificationPayload::new("Bluesky", "hi", "https://bsky.app");
        let names: Vec<&str> = headers_for(&payload).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Priority", "Title", "Click"]);
    }

    #[test]
    fn test_default_config() {
        assert_eq!(NtfyConfig::default().url, "http://0.0.0.0");
    }
}

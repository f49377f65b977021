//! Jetstream websocket 订阅
//!
//! 连接 `{url}?wantedCollections=...`，把文本帧解码为 `JetstreamEvent`。
//! 不做重连：连接关闭或出错时 stream 结束，由外部进程管理器负责重启。

use anyhow::{Context, Result};
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use super::event::JetstreamEvent;

/// 默认 Jetstream 实例
pub const DEFAULT_JETSTREAM_URL: &str = "wss://jetstream2.us-east.bsky.network/subscribe";

/// 事件流
pub type EventStream = BoxStream<'static, Result<JetstreamEvent>>;

/// 构建订阅 URL
pub fn subscribe_url(base: &str, collections: &[&str], cursor: Option<i64>) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("invalid jetstream url: {}", base))?;
    {
        let mut query = url.query_pairs_mut();
        for collection in collections {
            query.append_pair("wantedCollections", collection);
        }
        if let Some(cursor) = cursor {
            query.append_pair("cursor", &cursor.to_string());
        }
    }
    Ok(url)
}

/// 解码一个 websocket 帧；`None` 表示跳过
pub fn decode_frame(message: Message) -> Option<Result<JetstreamEvent>> {
    match message {
        Message::Text(text) => match serde_json::from_str::<JetstreamEvent>(&text) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                debug!(error = %e, "Skipping undecodable jetstream frame");
                None
            }
        },
        Message::Close(frame) => {
            info!(frame = ?frame, "Jetstream closed the connection");
            None
        }
        _ => None,
    }
}

/// Jetstream 订阅配置
#[derive(Debug, Clone)]
pub struct JetstreamSubscription {
    url: String,
    collections: Vec<&'static str>,
    cursor: Option<i64>,
}

impl JetstreamSubscription {
    pub fn new(url: impl Into<String>, collections: Vec<&'static str>) -> Self {
        Self {
            url: url.into(),
            collections,
            cursor: None,
        }
    }

    /// 从指定时间（微秒）开始回放
    pub fn with_cursor(mut self, cursor: Option<i64>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn url(&self) -> Result<Url> {
        subscribe_url(&self.url, &self.collections, self.cursor)
    }

    /// 建立连接并返回事件流
    pub async fn connect(&self) -> Result<EventStream> {
        let url = self.url()?;
        info!(url = %url, "Connecting to jetstream");

        let (socket, response) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect to {}", self.url))?;
        info!(status = %response.status(), "Connected to jetstream");

        let events = socket.filter_map(|message| async move {
            match message {
                Ok(message) => decode_frame(message),
                Err(e) => {
                    warn!(error = %e, "Jetstream read failed");
                    Some(Err(anyhow::Error::from(e).context("jetstream read failed")))
                }
            }
        });

        Ok(events.boxed())
    }
}

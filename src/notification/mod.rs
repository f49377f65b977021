//! 通知层 - 从提及事件到推送
//!
//! # 流程
//! 1. `MentionFilter` 判断事件是否提及目标身份
//! 2. `NotificationFormatter` 按 `WatchedCollection` 分发，解析上下文并生成 payload
//! 3. `NotificationSink` 把 payload 交给 `NotificationChannel`（默认 ntfy）
//!
//! # 使用示例
//! ```ignore
//! use mention_relay::notification::{MentionFilter, NotificationSink, NtfyChannel};
//!
//! let filter = MentionFilter::new("did:plc:target");
//! if let Some(mention) = filter.evaluate(&event) {
//!     if let Some(payload) = formatter.format(&mention).await {
//!         sink.send(&payload).await;
//!     }
//! }
//! ```

pub mod channel;
pub mod channels;
pub mod collection;
pub mod filter;
pub mod formatter;
pub mod payload;
pub mod priority;
pub mod sink;

pub use channel::{NotificationChannel, SendResult};
pub use channels::{NtfyChannel, NtfyConfig, DEFAULT_NTFY_URL};
pub use collection::WatchedCollection;
pub use filter::{Mention, MentionFilter};
pub use formatter::{LinkConfig, NotificationFormatter, DEFAULT_BSKY_URL, DEFAULT_PDSLS_URL, DEFAULT_TANGLED_URL};
pub use payload::NotificationPayload;
pub use priority::Priority;
pub use sink::NotificationSink;

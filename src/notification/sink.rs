//! 通知出口 - 把格式化好的 payload 交给渠道
//!
//! 发送失败只记录日志，不重试，也不向上传播。

use std::sync::Arc;
use tracing::{info, warn};

use super::channel::{NotificationChannel, SendResult};
use super::payload::NotificationPayload;

/// 通知出口
pub struct NotificationSink {
    channel: Arc<dyn NotificationChannel>,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl NotificationSink {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            channel,
            dry_run: false,
        }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// 发送一条通知
    pub async fn send(&self, payload: &NotificationPayload) -> SendResult {
        let name = self.channel.name();

        if self.dry_run {
            info!(
                channel = %name,
                title = %payload.title,
                priority = payload.priority.level(),
                url = %payload.url,
                message = %payload.message,
                "[DRY-RUN] Would send notification"
            );
            return SendResult::Skipped("dry-run".to_string());
        }

        let result = match self.channel.send(payload).await {
            Ok(r) => r,
            Err(e) => SendResult::Failed(e.to_string()),
        };

        match &result {
            SendResult::Sent => {
                info!(channel = %name, title = %payload.title, url = %payload.url, "Notification sent")
            }
            SendResult::Skipped(reason) => info!(channel = %name, reason = %reason, "Notification skipped"),
            SendResult::Failed(reason) => warn!(channel = %name, error = %reason, "Notification send failed"),
        }

        result
    }
}

//! 通知渠道 trait 定义

use anyhow::Result;
use async_trait::async_trait;

use super::payload::NotificationPayload;

/// 发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 跳过（dry-run 等）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

/// 通知渠道 trait
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 发送一条通知
    async fn send(&self, payload: &NotificationPayload) -> Result<SendResult>;
}

//! 通知 payload
//!
//! 每个通过过滤的事件构造一次，交给 sink 后即丢弃。

use serde::{Deserialize, Serialize};

use super::priority::Priority;

/// 推送通知内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// 标题（`Bluesky` / `Tangled`）
    pub title: String,
    /// 图标 URL（作者头像）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// 正文
    pub message: String,
    /// 点击跳转链接
    pub url: String,
    /// 优先级
    pub priority: Priority,
    /// 附件图片 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl NotificationPayload {
    /// 创建默认优先级的 payload
    pub fn new(title: impl Into<String>, message: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            icon: None,
            message: message.into(),
            url: url.into(),
            priority: Priority::Default,
            picture: None,
        }
    }

    /// 设置图标
    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon.filter(|i| !i.is_empty());
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// 设置附件图片
    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }
}

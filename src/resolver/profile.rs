//! Profile 解析 - 获取并缓存作者的公开资料
//!
//! 获取失败时返回占位 profile（handle = `handle.invalid`），
//! 调用方无需区分成功或失败。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::atproto::{ResolveResult, XrpcClient};
use crate::infra::cache::TimedCache;

/// 无效 handle 标记（AppView 对无法验证的 handle 也返回该值）
pub const INVALID_HANDLE: &str = "handle.invalid";

/// 占位 profile 的 displayName
pub const PLACEHOLDER_DISPLAY_NAME: &str = "silent error!";

/// 作者公开资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorProfile {
    pub did: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ActorProfile {
    /// 获取失败时使用的占位 profile
    pub fn placeholder(did: &str) -> Self {
        Self {
            did: did.to_string(),
            handle: INVALID_HANDLE.to_string(),
            display_name: Some(PLACEHOLDER_DISPLAY_NAME.to_string()),
            avatar: None,
        }
    }

    /// 可读名称：有效 handle 优先，否则退回 DID
    pub fn display_label(&self) -> &str {
        if self.handle != INVALID_HANDLE {
            &self.handle
        } else {
            &self.did
        }
    }
}

/// Profile 数据来源
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, did: &str) -> ResolveResult<ActorProfile>;
}

/// 通过 AppView 的 `app.bsky.actor.getProfile` 获取
#[derive(Debug, Clone)]
pub struct AppViewProfileSource {
    xrpc: XrpcClient,
    service: String,
}

impl AppViewProfileSource {
    pub fn new(xrpc: XrpcClient, service: impl Into<String>) -> Self {
        Self {
            xrpc,
            service: service.into(),
        }
    }
}

#[async_trait]
impl ProfileSource for AppViewProfileSource {
    async fn fetch_profile(&self, did: &str) -> ResolveResult<ActorProfile> {
        self.xrpc
            .query(&self.service, "app.bsky.actor.getProfile", &[("actor", did)])
            .await
    }
}

/// 带缓存的 profile 解析器
pub struct ProfileResolver {
    source: Box<dyn ProfileSource>,
    cache: TimedCache<String, ActorProfile>,
    ttl: Duration,
}

impl ProfileResolver {
    pub fn new(source: Box<dyn ProfileSource>, cache: TimedCache<String, ActorProfile>, ttl: Duration) -> Self {
        Self { source, cache, ttl }
    }

    /// 解析 DID 的 profile，失败时返回占位 profile
    pub async fn resolve(&mut self, did: &str) -> ActorProfile {
        let source = &self.source;
        self.cache
            .get(format!("bskyProfile_{}", did), Some(self.ttl), || async move {
                match source.fetch_profile(did).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        debug!(did = %did, error = %e, "Profile fetch failed, using placeholder");
                        ActorProfile::placeholder(did)
                    }
                }
            })
            .await
    }
}

//! 跨仓库 record 解析
//!
//! 解析流程：
//! 1. 解析 `at://` 引用，失败直接返回 `MalformedUri`（不发请求）
//! 2. 通过 `PdsLocator` 找到仓库所有者当前的 PDS
//! 3. 向该 PDS 发 `com.atproto.repo.getRecord`
//! 4. 结果（成功或失败）按 (collection, repo, rkey) 缓存 record TTL 时长

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::atproto::{CanonicalUri, PdsLocator, ResolveError, ResolveResult, XrpcClient};
use crate::infra::cache::TimedCache;
use crate::lexicon::{Issue, TangledRepo};

/// record 缓存键：(collection, repo, rkey)
pub type RecordCacheKey = (String, String, String);

/// 解析失败时展示的名称/标题
pub const NOT_FOUND_LABEL: &str = "Repository not found";

/// record 数据来源
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_record(&self, pds: &str, uri: &CanonicalUri) -> ResolveResult<serde_json::Value>;
}

#[async_trait]
impl RecordSource for XrpcClient {
    async fn fetch_record(&self, pds: &str, uri: &CanonicalUri) -> ResolveResult<serde_json::Value> {
        Ok(self.get_record(pds, uri).await?.value)
    }
}

pub fn cache_key(uri: &CanonicalUri) -> RecordCacheKey {
    (uri.collection.clone(), uri.repo.clone(), uri.rkey.clone())
}

/// 带缓存的 record 解析器
pub struct RecordResolver {
    locator: PdsLocator,
    source: Box<dyn RecordSource>,
    cache: TimedCache<RecordCacheKey, ResolveResult<serde_json::Value>>,
    ttl: Duration,
}

impl RecordResolver {
    pub fn new(
        locator: PdsLocator,
        source: Box<dyn RecordSource>,
        cache: TimedCache<RecordCacheKey, ResolveResult<serde_json::Value>>,
        ttl: Duration,
    ) -> Self {
        Self {
            locator,
            source,
            cache,
            ttl,
        }
    }

    /// 解析 `at://` 字符串引用
    pub async fn resolve(&mut self, uri: &str) -> ResolveResult<serde_json::Value> {
        let parsed = CanonicalUri::parse(uri)?;
        self.resolve_uri(&parsed).await
    }

    /// 解析已解析的引用
    pub async fn resolve_uri(&mut self, uri: &CanonicalUri) -> ResolveResult<serde_json::Value> {
        let locator = &mut self.locator;
        let source = &self.source;
        let result = self
            .cache
            .get(cache_key(uri), Some(self.ttl), || async move {
                let pds = locator.resolve_pds(&uri.repo).await?;
                source.fetch_record(&pds, uri).await
            })
            .await;

        if let Err(e) = &result {
            debug!(uri = %uri, error = %e, "Record resolution failed");
        }
        result
    }

    /// 解析并反序列化为指定 record 类型
    pub async fn resolve_as<T: DeserializeOwned>(&mut self, uri: &str) -> ResolveResult<T> {
        let value = self.resolve(uri).await?;
        serde_json::from_value(value).map_err(|e| ResolveError::Decode(format!("{}: {}", uri, e)))
    }

    /// `sh.tangled.repo`
    pub async fn repo(&mut self, uri: &str) -> ResolveResult<TangledRepo> {
        self.resolve_as(uri).await
    }

    /// `sh.tangled.repo.issue`
    pub async fn issue(&mut self, uri: &str) -> ResolveResult<Issue> {
        self.resolve_as(uri).await
    }

    /// 仓库名，失败时为 `Repository not found`
    pub async fn repo_name(&mut self, uri: &str) -> String {
        match self.repo(uri).await {
            Ok(repo) => repo.name,
            Err(_) => NOT_FOUND_LABEL.to_string(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

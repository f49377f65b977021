//! DID 文档解析 - 从 DID 找到托管 record 的 PDS
//!
//! 支持两种 DID method：
//! - `did:plc:*` → `GET {plc_directory}/{did}`
//! - `did:web:{host}` → `GET https://{host}/.well-known/did.json`
//!
//! `PdsLocator` 在文档解析之上再缓存一层 DID → endpoint 映射。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::error::{ResolveError, ResolveResult};
use crate::infra::cache::TimedCache;

/// 默认 PLC directory
pub const DEFAULT_PLC_DIRECTORY: &str = "https://plc.directory";

/// PDS service 的 id 片段
const PDS_SERVICE_ID: &str = "#atproto_pds";
/// PDS service 的类型
const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

/// DID 文档（只解析需要的字段）
#[derive(Debug, Clone, Deserialize)]
pub struct DidDocument {
    pub id: String,
    #[serde(default)]
    pub service: Vec<DidService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DidService {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    /// 可能是字符串，也可能是对象（后者不可用）
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: serde_json::Value,
}

impl DidDocument {
    /// 查找 `#atproto_pds` 类型为 `AtprotoPersonalDataServer` 的 endpoint
    ///
    /// id 既可能写成 `#atproto_pds`，也可能是带 DID 前缀的完整形式。
    pub fn pds_endpoint(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|s| {
                (s.id == PDS_SERVICE_ID || s.id == format!("{}{}", self.id, PDS_SERVICE_ID))
                    && s.service_type == PDS_SERVICE_TYPE
            })
            .and_then(|s| s.service_endpoint.as_str())
            .filter(|endpoint| !endpoint.is_empty())
    }
}

/// 计算 DID 文档的下载地址
pub fn document_url(did: &str, plc_directory: &str) -> ResolveResult<String> {
    if did.starts_with("did:plc:") {
        return Ok(format!("{}/{}", plc_directory.trim_end_matches('/'), did));
    }

    if let Some(rest) = did.strip_prefix("did:web:") {
        let mut segments = rest.split(':');
        let host = segments
            .next()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ResolveError::UnsupportedDid(did.to_string()))?
            .replace("%3A", ":");
        let path: Vec<&str> = segments.collect();

        return Ok(if path.is_empty() {
            format!("https://{}/.well-known/did.json", host)
        } else {
            format!("https://{}/{}/did.json", host, path.join("/"))
        });
    }

    Err(ResolveError::UnsupportedDid(did.to_string()))
}

/// DID 文档来源
#[async_trait]
pub trait DidDocumentSource: Send + Sync {
    async fn fetch_document(&self, did: &str) -> ResolveResult<DidDocument>;
}

/// 通过 HTTP 获取 DID 文档
#[derive(Debug, Clone)]
pub struct HttpDidDocumentSource {
    client: Client,
    plc_directory: String,
}

impl HttpDidDocumentSource {
    pub fn new(client: Client, plc_directory: impl Into<String>) -> Self {
        Self {
            client,
            plc_directory: plc_directory.into(),
        }
    }
}

#[async_trait]
impl DidDocumentSource for HttpDidDocumentSource {
    async fn fetch_document(&self, did: &str) -> ResolveResult<DidDocument> {
        let url = document_url(did, &self.plc_directory)?;
        debug!(did = %did, url = %url, "Fetching DID document");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ResolveError::Http(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let doc: DidDocument = response.json().await?;
        if doc.id != did {
            return Err(ResolveError::Decode(format!(
                "document id {} does not match {}",
                doc.id, did
            )));
        }
        Ok(doc)
    }
}

/// DID → PDS endpoint 解析器（带缓存）
pub struct PdsLocator {
    source: Box<dyn DidDocumentSource>,
    cache: TimedCache<String, ResolveResult<String>>,
}

impl PdsLocator {
    pub fn new(source: Box<dyn DidDocumentSource>, cache: TimedCache<String, ResolveResult<String>>) -> Self {
        Self { source, cache }
    }

    /// 解析 DID 当前的 PDS endpoint
    pub async fn resolve_pds(&mut self, did: &str) -> ResolveResult<String> {
        let source = &self.source;
        self.cache
            .get(did.to_string(), None, || async move {
                let doc = source.fetch_document(did).await?;
                doc.pds_endpoint()
                    .map(|endpoint| endpoint.trim_end_matches('/').to_string())
                    .ok_or_else(|| ResolveError::NoPdsEndpoint(did.to_string()))
            })
            .await
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

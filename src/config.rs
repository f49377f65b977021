//! 运行配置
//!
//! 读取优先级（后者覆盖前者）：
//! 1. 内置默认值
//! 2. 配置文件 `~/.config/mention-relay/config.json`（或 `--config` 指定的路径，字段为 snake_case）
//! 3. 环境变量 `TARGET_DID`、`JETSTREAM_URL`、`NTFY_URL`、`BSKY_URL`、`PDSLS_URL`、`TANGLED_URL`、
//!    `PLC_DIRECTORY_URL`、`APPVIEW_URL`、`HTTP_TIMEOUT_SECS`、`CACHE_CAPACITY`
//! 4. 命令行参数（在 main 中覆盖）

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::atproto::{DEFAULT_APPVIEW_URL, DEFAULT_PLC_DIRECTORY};
use crate::atproto::xrpc::DEFAULT_TIMEOUT_SECS;
use crate::infra::cache::DEFAULT_CAPACITY;
use crate::jetstream::DEFAULT_JETSTREAM_URL;
use crate::notification::{LinkConfig, DEFAULT_BSKY_URL, DEFAULT_NTFY_URL, DEFAULT_PDSLS_URL, DEFAULT_TANGLED_URL};

/// 默认监听的身份
pub const DEFAULT_TARGET_DID: &str = "did:plc:3c6vkaq7xf5kz3va3muptjh5";

/// 基础缓存时长（秒）
pub const DEFAULT_BASE_CACHE_LIFETIME_SECS: u64 = 60 * 60;

/// profile 缓存时长倍数
const PROFILE_TTL_FACTOR: u32 = 4;
/// record 缓存时长倍数
const RECORD_TTL_FACTOR: u32 = 24;

/// 运行配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// 监听的目标 DID
    pub target_did: String,
    pub jetstream_url: String,
    /// ntfy 推送地址
    pub ntfy_url: String,
    pub bsky_url: String,
    pub pdsls_url: String,
    pub tangled_url: String,
    pub plc_directory_url: String,
    pub appview_url: String,
    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    /// 每个缓存的最大条目数
    pub cache_capacity: usize,
    /// 基础缓存时长（秒）
    pub base_cache_lifetime_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            target_did: DEFAULT_TARGET_DID.to_string(),
            jetstream_url: DEFAULT_JETSTREAM_URL.to_string(),
            ntfy_url: DEFAULT_NTFY_URL.to_string(),
            bsky_url: DEFAULT_BSKY_URL.to_string(),
            pdsls_url: DEFAULT_PDSLS_URL.to_string(),
            tangled_url: DEFAULT_TANGLED_URL.to_string(),
            plc_directory_url: DEFAULT_PLC_DIRECTORY.to_string(),
            appview_url: DEFAULT_APPVIEW_URL.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_capacity: DEFAULT_CAPACITY,
            base_cache_lifetime_secs: DEFAULT_BASE_CACHE_LIFETIME_SECS,
        }
    }
}

impl RelayConfig {
    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/mention-relay/config.json"))
    }

    /// 按优先级加载：默认值 → 配置文件 → 环境变量
    ///
    /// 显式指定的路径不存在时报错；默认路径不存在时静默跳过。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env();
        Ok(config)
    }

    /// 从 JSON 文件读取，缺失字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// 用进程环境变量覆盖
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// 用任意查找函数覆盖（空值忽略，数字解析失败时告警并忽略）
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let strings: [(&str, &mut String); 8] = [
            ("TARGET_DID", &mut self.target_did),
            ("JETSTREAM_URL", &mut self.jetstream_url),
            ("NTFY_URL", &mut self.ntfy_url),
            ("BSKY_URL", &mut self.bsky_url),
            ("PDSLS_URL", &mut self.pdsls_url),
            ("TANGLED_URL", &mut self.tangled_url),
            ("PLC_DIRECTORY_URL", &mut self.plc_directory_url),
            ("APPVIEW_URL", &mut self.appview_url),
        ];
        for (key, field) in strings {
            if let Some(value) = lookup(key) {
                *field = value.trim().to_string();
            }
        }

        if let Some(value) = lookup("HTTP_TIMEOUT_SECS") {
            match value.trim().parse() {
                Ok(secs) => self.http_timeout_secs = secs,
                Err(e) => warn!(key = "HTTP_TIMEOUT_SECS", value = %value, error = %e, "Ignoring invalid env value"),
            }
        }
        if let Some(value) = lookup("CACHE_CAPACITY") {
            match value.trim().parse() {
                Ok(capacity) => self.cache_capacity = capacity,
                Err(e) => warn!(key = "CACHE_CAPACITY", value = %value, error = %e, "Ignoring invalid env value"),
            }
        }
    }

    /// 检查明显错误的配置
    pub fn validate(&self) -> Result<()> {
        if !self.target_did.starts_with("did:") {
            return Err(anyhow!("target_did must be a DID, got {:?}", self.target_did));
        }
        if self.http_timeout_secs == 0 {
            return Err(anyhow!("http_timeout_secs must be greater than 0"));
        }
        if self.base_cache_lifetime_secs == 0 {
            return Err(anyhow!("base_cache_lifetime_secs must be greater than 0"));
        }
        Ok(())
    }

    /// 基础缓存时长（DID → PDS）
    pub fn base_cache_lifetime(&self) -> Duration {
        Duration::from_secs(self.base_cache_lifetime_secs)
    }

    /// profile 缓存时长
    pub fn profile_ttl(&self) -> Duration {
        self.base_cache_lifetime() * PROFILE_TTL_FACTOR
    }

    /// 跨仓库 record 缓存时长
    pub fn record_ttl(&self) -> Duration {
        self.base_cache_lifetime() * RECORD_TTL_FACTOR
    }

    pub fn links(&self) -> LinkConfig {
        LinkConfig {
            bsky_url: self.bsky_url.clone(),
            pdsls_url: self.pdsls_url.clone(),
            tangled_url: self.tangled_url.clone(),
        }
    }
}

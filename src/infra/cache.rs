//! 带过期时间的缓存
//!
//! 所有远程查询（profile、DID 文档、record）都通过 `TimedCache` 记忆化。
//!
//! ## 过期策略
//! 1. 每条记录保存写入时间和 TTL，读取时惰性检查 `now - stored_at < ttl`
//! 2. 没有后台清理任务
//! 3. 超过容量时按 LRU 淘汰最久未使用的记录

use lru::LruCache;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// 默认容量（每个缓存）
pub const DEFAULT_CAPACITY: usize = 4096;

/// 时钟抽象，测试时可替换为 `ManualClock`
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// 系统单调时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 手动推进的时钟
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 时钟前进 `by`
    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

/// 缓存记录
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// 是否仍在有效期内
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// 带 TTL 的 LRU 缓存
pub struct TimedCache<K, V> {
    entries: LruCache<K, CacheEntry<V>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq, V: Clone> TimedCache<K, V> {
    /// 使用系统时钟创建缓存
    pub fn new(default_ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(default_ttl, capacity, Arc::new(SystemClock))
    }

    /// 使用指定时钟创建缓存
    pub fn with_clock(default_ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(if capacity == 0 { DEFAULT_CAPACITY } else { capacity })
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            default_ttl,
            clock,
            hits: 0,
            misses: 0,
        }
    }

    /// 读取缓存，未命中或已过期时调用 `fetcher` 并写回
    ///
    /// `fetcher` 的结果（包括失败结果）会被原样缓存 `ttl` 时长。
    pub async fn get<F, Fut>(&mut self, key: K, ttl: Option<Duration>, fetcher: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(&key) {
            if entry.is_fresh(now) {
                self.hits += 1;
                return entry.value.clone();
            }
        }

        self.misses += 1;
        let value = fetcher().await;
        let ttl = ttl.unwrap_or(self.default_ttl);
        let evicts = !self.entries.contains(&key) && self.entries.len() == self.entries.cap().get();
        let entry = CacheEntry {
            value: value.clone(),
            stored_at: now,
            ttl,
        };
        if self.entries.push(key, entry).is_some() && evicts {
            trace!(capacity = self.entries.cap().get(), "Evicted least recently used cache entry");
        }
        value
    }

    /// 只读查看（不刷新 LRU 顺序，不触发 fetch）
    pub fn peek(&self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        self.entries
            .peek(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

//! 提及过滤器 - 判断一条事件是否需要通知
//!
//! ## 过滤规则（按开销从低到高依次检查）
//! 1. 作者不是目标 DID
//! 2. 是 commit 事件，且操作为 create
//! 3. collection 在监听集合中
//! 4. 序列化后的 record 文本包含目标 DID
//!
//! 第 4 条是粗粒度的字符串匹配：record 任意位置出现目标 DID 都算提及。

use std::collections::HashSet;
use tracing::trace;

use super::collection::WatchedCollection;
use crate::jetstream::{EventKind, JetstreamEvent, Operation};

/// 通过过滤的事件
#[derive(Debug, Clone, Copy)]
pub struct Mention<'a> {
    pub collection: WatchedCollection,
    pub author: &'a str,
    pub rkey: &'a str,
    pub record: &'a serde_json::Value,
}

/// 提及过滤器
#[derive(Debug, Clone)]
pub struct MentionFilter {
    target: String,
    watched: HashSet<WatchedCollection>,
}

impl MentionFilter {
    /// 监听全部 collection
    pub fn new(target: impl Into<String>) -> Self {
        Self::with_collections(target, WatchedCollection::ALL)
    }

    pub fn with_collections(
        target: impl Into<String>,
        collections: impl IntoIterator<Item = WatchedCollection>,
    ) -> Self {
        Self {
            target: target.into(),
            watched: collections.into_iter().collect(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// 监听的 NSID 列表（订阅参数）
    pub fn watched_nsids(&self) -> Vec<&'static str> {
        WatchedCollection::ALL
            .iter()
            .filter(|c| self.watched.contains(c))
            .map(|c| c.nsid())
            .collect()
    }

    /// 评估事件，通过时返回提及信息
    pub fn evaluate<'a>(&self, event: &'a JetstreamEvent) -> Option<Mention<'a>> {
        if event.did == self.target || event.kind != EventKind::Commit {
            return None;
        }

        let commit = event.commit.as_ref()?;
        if commit.operation != Operation::Create {
            return None;
        }

        let collection = WatchedCollection::from_nsid(&commit.collection)
            .filter(|c| self.watched.contains(c))?;

        let record = commit.record.as_ref()?;
        // 最后才做序列化
        let text = serde_json::to_string(record).ok()?;
        if !text.contains(&self.target) {
            return None;
        }

        trace!(author = %event.did, collection = %collection, rkey = %commit.rkey, "Mention matched");
        Some(Mention {
            collection,
            author: &event.did,
            rkey: &commit.rkey,
            record,
        })
    }

    /// 是否需要通知
    pub fn matches(&self, event: &JetstreamEvent) -> bool {
        self.evaluate(event).is_some()
    }
}

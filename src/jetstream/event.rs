//! Jetstream 事件结构
//!
//! ```json
//! {
//!   "did": "did:plc:...",
//!   "time_us": 1725911162329308,
//!   "kind": "commit",
//!   "commit": {
//!     "rev": "3l3qo2vutsw2b",
//!     "operation": "create",
//!     "collection": "app.bsky.feed.post",
//!     "rkey": "3l3qo2vuowo2b",
//!     "record": { ... },
//!     "cid": "bafyrei..."
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Commit,
    Identity,
    Account,
    #[serde(other)]
    Unknown,
}

/// commit 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// commit 内容（delete 没有 record）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub rev: String,
    pub operation: Operation,
    pub collection: String,
    pub rkey: String,
    #[serde(default)]
    pub record: Option<serde_json::Value>,
    #[serde(default)]
    pub cid: Option<String>,
}

/// 一条 Jetstream 事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetstreamEvent {
    /// 作者 DID
    pub did: String,
    #[serde(default)]
    pub time_us: i64,
    pub kind: EventKind,
    #[serde(default)]
    pub commit: Option<Commit>,
}

impl JetstreamEvent {
    /// 构造一条 create commit 事件
    pub fn create(
        did: impl Into<String>,
        collection: impl Into<String>,
        rkey: impl Into<String>,
        record: serde_json::Value,
    ) -> Self {
        Self {
            did: did.into(),
            time_us: 0,
            kind: EventKind::Commit,
            commit: Some(Commit {
                rev: String::new(),
                operation: Operation::Create,
                collection: collection.into(),
                rkey: rkey.into(),
                record: Some(record),
                cid: None,
            }),
        }
    }

    /// 事件时间
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(
            self.time_us.div_euclid(1_000_000),
            (self.time_us.rem_euclid(1_000_000) * 1_000) as u32,
        )
    }
}

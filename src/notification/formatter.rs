//! 通知格式化 - 将提及事件转为推送内容
//!
//! 每个 collection 一个格式化函数：
//! - 解析作者 profile（失败时使用占位 profile）
//! - 需要时解析被引用的 record（star → repo，issue → repo，comment → issue → repo）
//! - 生成消息正文、跳转链接和优先级
//!
//! 格式化从不失败：任何解析错误都降级为 `Repository not found` 文案。

use serde::de::DeserializeOwned;
use tracing::debug;

use super::collection::WatchedCollection;
use super::filter::Mention;
use super::payload::NotificationPayload;
use super::priority::Priority;
use crate::lexicon::{Issue, IssueComment, Post, Star, GRAPH_VERIFICATION};
use crate::resolver::{ActorProfile, ProfileResolver, RecordResolver, NOT_FOUND_LABEL};

/// Bluesky 前端默认地址
pub const DEFAULT_BSKY_URL: &str = "https://bsky.app";
/// PDSls record 浏览器默认地址
pub const DEFAULT_PDSLS_URL: &str = "https://pdsls.dev";
/// Tangled 前端默认地址
pub const DEFAULT_TANGLED_URL: &str = "https://tangled.sh";

const BLUESKY_TITLE: &str = "Bluesky";
const TANGLED_TITLE: &str = "Tangled";

/// 前端链接配置
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConfig {
    pub bsky_url: String,
    pub pdsls_url: String,
    pub tangled_url: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bsky_url: DEFAULT_BSKY_URL.to_string(),
            pdsls_url: DEFAULT_PDSLS_URL.to_string(),
            tangled_url: DEFAULT_TANGLED_URL.to_string(),
        }
    }
}

impl LinkConfig {
    /// Bluesky 帖子永久链接
    pub fn bsky_post(&self, did: &str, rkey: &str) -> String {
        format!("{}/profile/{}/post/{}", self.bsky_url, did, rkey)
    }

    pub fn bsky_profile(&self, did: &str) -> String {
        format!("{}/profile/{}", self.bsky_url, did)
    }

    /// 通用 record 浏览器链接
    pub fn pdsls_record(&self, did: &str, collection: &str, rkey: &str) -> String {
        format!("{}/at://{}/{}/{}", self.pdsls_url, did, collection, rkey)
    }

    pub fn tangled_profile(&self, did: &str) -> String {
        format!("{}/@{}", self.tangled_url, did)
    }

    pub fn tangled_home(&self) -> String {
        self.tangled_url.clone()
    }
}

/// 解码 record，失败时退回默认值
fn decode_or_default<T: DeserializeOwned + Default>(collection: WatchedCollection, record: &serde_json::Value) -> T {
    match serde_json::from_value(record.clone()) {
        Ok(value) => value,
        Err(e) => {
            debug!(collection = %collection, error = %e, "Record did not match expected shape");
            T::default()
        }
    }
}

/// `{label}: {body}`，body 为空时省略冒号
fn with_body(head: String, body: &str) -> String {
    if body.is_empty() {
        head
    } else {
        format!("{}: {}", head, body)
    }
}

/// 通知格式化器
pub struct NotificationFormatter {
    target: String,
    links: LinkConfig,
    profiles: ProfileResolver,
    records: RecordResolver,
}

impl NotificationFormatter {
    pub fn new(
        target: impl Into<String>,
        links: LinkConfig,
        profiles: ProfileResolver,
        records: RecordResolver,
    ) -> Self {
        Self {
            target: target.into(),
            links,
            profiles,
            records,
        }
    }

    /// 按 collection 分发；`None` 表示该 collection 不发通知
    pub async fn format(&mut self, mention: &Mention<'_>) -> Option<NotificationPayload> {
        let did = mention.author;
        let rkey = mention.rkey;
        let record = mention.record;
        let collection = mention.collection;

        let payload = match collection {
            WatchedCollection::Post => self.post(did, rkey, decode_or_default(collection, record)).await,
            WatchedCollection::BskyFollow => self.bsky_follow(did).await,
            WatchedCollection::Verification => self.verification(did, rkey).await,
            WatchedCollection::TangledFollow => self.tangled_follow(did).await,
            WatchedCollection::Star => self.star(did, decode_or_default(collection, record)).await,
            WatchedCollection::Issue => self.issue(did, decode_or_default(collection, record)).await,
            WatchedCollection::IssueComment => {
                self.issue_comment(did, decode_or_default(collection, record)).await
            }
            WatchedCollection::IssueState => return None,
        };
        Some(payload)
    }

    async fn profile(&mut self, did: &str) -> ActorProfile {
        self.profiles.resolve(did).await
    }

    /// `app.bsky.feed.post`
    pub async fn post(&mut self, did: &str, rkey: &str, post: Post) -> NotificationPayload {
        let profile = self.profile(did).await;

        let kind = if post.is_reply_to(&self.target) {
            "replied"
        } else {
            "mentioned you"
        };

        let mut message = format!("{} {}: {}", profile.display_label(), kind, post.text);
        if let Some(embed) = post.embed_kind() {
            if !post.text.is_empty() {
                message.push(' ');
            }
            message.push_str(&format!("[{}]", embed.label()));
        }

        NotificationPayload::new(BLUESKY_TITLE, message, self.links.bsky_post(&profile.did, rkey))
            .with_icon(profile.avatar)
    }

    /// `app.bsky.graph.follow`
    pub async fn bsky_follow(&mut self, did: &str) -> NotificationPayload {
        let profile = self.profile(did).await;

        NotificationPayload::new(
            BLUESKY_TITLE,
            format!("{} followed you", profile.display_label()),
            self.links.bsky_profile(&profile.did),
        )
        .with_icon(profile.avatar)
        .with_priority(Priority::Low)
    }

    /// `app.bsky.graph.verification`
    pub async fn verification(&mut self, did: &str, rkey: &str) -> NotificationPayload {
        let profile = self.profile(did).await;

        NotificationPayload::new(
            BLUESKY_TITLE,
            format!("{} verified you", profile.display_label()),
            self.links.pdsls_record(did, GRAPH_VERIFICATION, rkey),
        )
        .with_icon(profile.avatar)
        .with_priority(Priority::Low)
    }

    /// `sh.tangled.graph.follow`
    pub async fn tangled_follow(&mut self, did: &str) -> NotificationPayload {
        let profile = self.profile(did).await;

        NotificationPayload::new(
            TANGLED_TITLE,
            format!("{} followed you", profile.display_label()),
            self.links.tangled_profile(&profile.did),
        )
        .with_icon(profile.avatar)
        .with_priority(Priority::Low)
    }

    /// `sh.tangled.feed.star`
    pub async fn star(&mut self, did: &str, star: Star) -> NotificationPayload {
        let profile = self.profile(did).await;
        let repo = self.records.repo_name(&star.subject).await;

        NotificationPayload::new(
            TANGLED_TITLE,
            format!("{} starred {}", profile.display_label(), repo),
            self.links.tangled_profile(&profile.did),
        )
        .with_icon(profile.avatar)
        .with_priority(Priority::Low)
    }

    /// `sh.tangled.repo.issue`
    pub async fn issue(&mut self, did: &str, issue: Issue) -> NotificationPayload {
        let profile = self.profile(did).await;
        let repo = self.records.repo_name(&issue.repo).await;

        let head = format!(
            "{} opened an issue, \"{}\", on {}",
            profile.display_label(),
            issue.title,
            repo
        );

        NotificationPayload::new(
            TANGLED_TITLE,
            with_body(head, issue.body.as_deref().unwrap_or_default()),
            self.links.tangled_home(),
        )
        .with_icon(profile.avatar)
    }

    /// `sh.tangled.repo.issue.comment`
    pub async fn issue_comment(&mut self, did: &str, comment: IssueComment) -> NotificationPayload {
        let profile = self.profile(did).await;

        let (issue_title, repo) = match self.records.issue(&comment.issue).await {
            Ok(issue) => {
                let repo = self.records.repo_name(&issue.repo).await;
                (issue.title, repo)
            }
            Err(e) => {
                debug!(issue = %comment.issue, error = %e, "Issue unresolvable, using placeholder");
                (NOT_FOUND_LABEL.to_string(), NOT_FOUND_LABEL.to_string())
            }
        };

        let head = format!(
            "{} commented on issue \"{}\", on {}",
            profile.display_label(),
            issue_title,
            repo
        );

        NotificationPayload::new(
            TANGLED_TITLE,
            with_body(head, &comment.body),
            self.links.tangled_profile(&profile.did),
        )
        .with_icon(profile.avatar)
    }
}

//! Record shapes for the watched collections
//!
//! Only the fields the formatters read are modelled; everything else in the
//! record is ignored by serde.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Bluesky post
pub const FEED_POST: &str = "app.bsky.feed.post";
/// Bluesky follow
pub const GRAPH_FOLLOW: &str = "app.bsky.graph.follow";
/// Bluesky verification
pub const GRAPH_VERIFICATION: &str = "app.bsky.graph.verification";
/// Tangled follow
pub const TANGLED_FOLLOW: &str = "sh.tangled.graph.follow";
/// Tangled star
pub const TANGLED_STAR: &str = "sh.tangled.feed.star";
/// Tangled issue
pub const TANGLED_ISSUE: &str = "sh.tangled.repo.issue";
/// Tangled issue comment
pub const TANGLED_ISSUE_COMMENT: &str = "sh.tangled.repo.issue.comment";
/// Tangled issue open/close state
pub const TANGLED_ISSUE_STATE: &str = "sh.tangled.repo.issue.state";

/// Decodes an optional sub-object, treating a malformed value as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// `com.atproto.repo.strongRef`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    #[serde(default)]
    pub cid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root: StrongRef,
    pub parent: StrongRef,
}

/// Any embed; only the `$type` discriminator is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(rename = "$type")]
    pub embed_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    External,
    Images,
    Record,
    RecordWithMedia,
    Video,
}

impl EmbedKind {
    pub fn from_type(embed_type: &str) -> Option<Self> {
        match embed_type {
            "app.bsky.embed.external" => Some(EmbedKind::External),
            "app.bsky.embed.images" => Some(EmbedKind::Images),
            "app.bsky.embed.record" => Some(EmbedKind::Record),
            "app.bsky.embed.recordWithMedia" => Some(EmbedKind::RecordWithMedia),
            "app.bsky.embed.video" => Some(EmbedKind::Video),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmbedKind::External => "External Link",
            EmbedKind::Images => "Image",
            EmbedKind::Record => "Record",
            EmbedKind::RecordWithMedia => "Record with Media",
            EmbedKind::Video => "Video",
        }
    }
}

/// `app.bsky.feed.post`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub reply: Option<ReplyRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub embed: Option<Embed>,
}

impl Post {
    /// Whether this post replies into a thread touching `did`.
    pub fn is_reply_to(&self, did: &str) -> bool {
        self.reply
            .as_ref()
            .map(|r| r.parent.uri.contains(did) || r.root.uri.contains(did))
            .unwrap_or(false)
    }

    pub fn embed_kind(&self) -> Option<EmbedKind> {
        self.embed
            .as_ref()
            .and_then(|e| EmbedKind::from_type(&e.embed_type))
    }
}

/// `sh.tangled.feed.star`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Star {
    #[serde(default)]
    pub subject: String,
}

/// `sh.tangled.repo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TangledRepo {
    pub name: String,
}

/// `sh.tangled.repo.issue`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub repo: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// `sh.tangled.repo.issue.comment`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueComment {
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub body: String,
}

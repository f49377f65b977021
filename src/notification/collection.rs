//! 监听的 record collection
//!
//! 每个 collection 对应一个 variant，格式化分发是穷尽匹配，
//! 新增 collection 时编译器会提示补齐处理逻辑。

use crate::lexicon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedCollection {
    /// `app.bsky.feed.post`
    Post,
    /// `app.bsky.graph.follow`
    BskyFollow,
    /// `app.bsky.graph.verification`
    Verification,
    /// `sh.tangled.graph.follow`
    TangledFollow,
    /// `sh.tangled.feed.star`
    Star,
    /// `sh.tangled.repo.issue`
    Issue,
    /// `sh.tangled.repo.issue.comment`
    IssueComment,
    /// `sh.tangled.repo.issue.state`（订阅但不发通知）
    IssueState,
}

impl WatchedCollection {
    pub const ALL: [WatchedCollection; 8] = [
        WatchedCollection::Post,
        WatchedCollection::BskyFollow,
        WatchedCollection::Verification,
        WatchedCollection::TangledFollow,
        WatchedCollection::Star,
        WatchedCollection::Issue,
        WatchedCollection::IssueComment,
        WatchedCollection::IssueState,
    ];

    /// NSID
    pub fn nsid(&self) -> &'static str {
        match self {
            WatchedCollection::Post => lexicon::FEED_POST,
            WatchedCollection::BskyFollow => lexicon::GRAPH_FOLLOW,
            WatchedCollection::Verification => lexicon::GRAPH_VERIFICATION,
            WatchedCollection::TangledFollow => lexicon::TANGLED_FOLLOW,
            WatchedCollection::Star => lexicon::TANGLED_STAR,
            WatchedCollection::Issue => lexicon::TANGLED_ISSUE,
            WatchedCollection::IssueComment => lexicon::TANGLED_ISSUE_COMMENT,
            WatchedCollection::IssueState => lexicon::TANGLED_ISSUE_STATE,
        }
    }

    pub fn from_nsid(nsid: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.nsid() == nsid)
    }

    /// 所有 NSID（用于订阅参数）
    pub fn all_nsids() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.nsid()).collect()
    }
}

impl std::fmt::Display for WatchedCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.nsid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nsid_round_trip() {
        for collection in WatchedCollection::ALL {
            assert_eq!(WatchedCollection::from_nsid(collection.nsid()), Some(collection));
        }
    }

    #[test]
    fn test_unknown_nsid() {
        assert_eq!(WatchedCollection::from_nsid("app.bsky.feed.like"), None);
        assert_eq!(WatchedCollection::from_nsid("sh.tangled.repo"), None);
    }

    #[test]
    fn test_all_nsids() {
        let nsids = WatchedCollection::all_nsids();
        assert_eq!(nsids.len(), 8);
        assert!(nsids.contains(&"sh.tangled.repo.issue.state"));
    }
}

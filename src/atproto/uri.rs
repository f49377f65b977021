//! `at://` 资源引用解析
//!
//! 只接受 canonical 形式：`at://{did}/{collection}/{rkey}`，
//! authority 必须是 DID（不接受 handle），三段缺一不可。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::error::ResolveError;

fn canonical_uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^at://(did:[a-z]+:[A-Za-z0-9._:%-]*[A-Za-z0-9._-])/([A-Za-z][A-Za-z0-9-]*(?:\.[A-Za-z0-9-]+)+)/([A-Za-z0-9._~:-]{1,512})$",
        )
        .expect("canonical uri regex is valid")
    })
}

/// Canonical resource reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalUri {
    /// 仓库所有者 DID
    pub repo: String,
    /// record collection (NSID)
    pub collection: String,
    /// record key
    pub rkey: String,
}

impl CanonicalUri {
    pub fn new(
        repo: impl Into<String>,
        collection: impl Into<String>,
        rkey: impl Into<String>,
    ) -> Self {
        Self {
            repo: repo.into(),
            collection: collection.into(),
            rkey: rkey.into(),
        }
    }

    /// 解析 `at://` URI，失败时返回 `ResolveError::MalformedUri`
    pub fn parse(uri: &str) -> Result<Self, ResolveError> {
        let caps = canonical_uri_regex()
            .captures(uri.trim())
            .ok_or_else(|| ResolveError::MalformedUri(uri.to_string()))?;

        Ok(Self::new(&caps[1], &caps[2], &caps[3]))
    }
}

impl FromStr for CanonicalUri {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at://{}/{}/{}", self.repo, self.collection, self.rkey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_uri() {
        let uri = CanonicalUri::parse(
            "at://did:plc:3c6vkaq7xf5kz3va3muptjh5/sh.tangled.repo/3lxyz2abcde22",
        )
        .unwrap();
        assert_eq!(uri.repo, "did:plc:3c6vkaq7xf5kz3va3muptjh5");
        assert_eq!(uri.collection, "sh.tangled.repo");
        assert_eq!(uri.rkey, "3lxyz2abcde22");
    }

    #[test]
    fn test_parse_did_web() {
        let uri = CanonicalUri::parse("at://did:web:fake/nope.nada/nada").unwrap();
        assert_eq!(uri.repo, "did:web:fake");
        assert_eq!(uri.to_string(), "at://did:web:fake/nope.nada/nada");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "https://example.com/a/b",
            "at://did:plc:abc",
            "at://did:plc:abc/app.bsky.feed.post",
            "at://alice.bsky.social/app.bsky.feed.post/3k",
            "at://did:plc:abc/notannsid/3k",
            "at://did:plc:abc/app.bsky.feed.post/3k/extra",
        ] {
            assert!(
                matches!(CanonicalUri::parse(bad), Err(ResolveError::MalformedUri(_))),
                "should reject {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_from_str() {
        let uri: CanonicalUri = "at://did:plc:abc/app.bsky.feed.post/3kabc".parse().unwrap();
        assert_eq!(uri.collection, "app.bsky.feed.post");
    }
}

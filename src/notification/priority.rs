//! Priority levels for push notifications
//!
//! Values follow the ntfy scale, sent as the `Priority` header:
//! - 1 MIN / 2 LOW: identity-level events (follows, verifications, stars)
//! - 3 DEFAULT: mentions, replies, issues and comments
//! - 4 HIGH / 5 MAX: unused by the built-in formatters

/// Notification priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    Min,
    Low,
    Default,
    High,
    Max,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Default
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Min => "MIN",
            Priority::Low => "LOW",
            Priority::Default => "DEFAULT",
            Priority::High => "HIGH",
            Priority::Max => "MAX",
        }
    }

    /// Numeric level 1-5
    pub fn level(&self) -> u8 {
        match self {
            Priority::Min => 1,
            Priority::Low => 2,
            Priority::Default => 3,
            Priority::High => 4,
            Priority::Max => 5,
        }
    }

    /// Header value for the push request
    pub fn header_value(&self) -> String {
        self.level().to_string()
    }
}

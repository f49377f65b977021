//! Mention Relay - 监听 Jetstream，把提及目标身份的事件推送到 ntfy

pub mod atproto;
pub mod config;
pub mod infra;
pub mod jetstream;
pub mod lexicon;
pub mod notification;
pub mod relay;
pub mod resolver;

pub use atproto::{CanonicalUri, PdsLocator, ResolveError, ResolveResult, XrpcClient};
pub use config::RelayConfig;
pub use infra::{Clock, ManualClock, SystemClock, TimedCache};
pub use jetstream::{JetstreamEvent, JetstreamSubscription};
pub use notification::{
    MentionFilter, NotificationChannel, NotificationFormatter, NotificationPayload, NotificationSink, NtfyChannel,
    Priority, SendResult, WatchedCollection,
};
pub use relay::{stop_signal, EventLoop, RelayStats};
pub use resolver::{ActorProfile, ProfileResolver, RecordResolver};

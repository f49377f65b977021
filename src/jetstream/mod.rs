//! Jetstream 事件流 - 事件结构与 websocket 订阅

pub mod event;
pub mod subscription;

pub use event::{Commit, EventKind, JetstreamEvent, Operation};
pub use subscription::{subscribe_url, EventStream, JetstreamSubscription, DEFAULT_JETSTREAM_URL};

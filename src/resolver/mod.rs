//! 远程上下文解析 - profile 与跨仓库 record

pub mod profile;
pub mod record;

pub use profile::{ActorProfile, AppViewProfileSource, ProfileResolver, ProfileSource, INVALID_HANDLE};
pub use record::{RecordCacheKey, RecordResolver, RecordSource, NOT_FOUND_LABEL};

//! 基础设施层 - 带过期时间的缓存

pub mod cache;

pub use cache::{Clock, ManualClock, SystemClock, TimedCache};

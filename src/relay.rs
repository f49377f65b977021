//! 事件循环 - 订阅流 → 过滤 → 格式化 → 推送
//!
//! 单任务顺序处理：一条事件处理完（含所有远程解析和推送）才读取下一条，
//! 通知按事件顺序发出。缓存随解析器由本循环独占，不需要锁。
//!
//! 停止信号在两条事件之间检查；流结束或传输错误都会结束循环（不重连）。

use anyhow::Result;
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::jetstream::JetstreamEvent;
use crate::notification::{MentionFilter, NotificationFormatter, NotificationSink, SendResult};

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// 收到的事件数
    pub received: u64,
    /// 通过过滤的事件数
    pub matched: u64,
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
    /// 通过过滤但不发通知的事件数（如 issue.state）
    pub unhandled: u64,
}

impl RelayStats {
    fn record(&mut self, result: &SendResult) {
        match result {
            SendResult::Sent => self.sent += 1,
            SendResult::Skipped(_) => self.skipped += 1,
            SendResult::Failed(_) => self.failed += 1,
        }
    }

    pub fn log_summary(&self) {
        info!(
            received = self.received,
            matched = self.matched,
            sent = self.sent,
            skipped = self.skipped,
            failed = self.failed,
            unhandled = self.unhandled,
            "Relay stopped"
        );
    }
}

/// 停止信号的发送端
pub type StopHandle = watch::Sender<bool>;

/// 创建停止信号，发送 `true` 表示停止
pub fn stop_signal() -> (StopHandle, watch::Receiver<bool>) {
    watch::channel(false)
}

/// 事件循环
pub struct EventLoop {
    filter: MentionFilter,
    formatter: NotificationFormatter,
    sink: NotificationSink,
    stats: RelayStats,
}

impl EventLoop {
    pub fn new(filter: MentionFilter, formatter: NotificationFormatter, sink: NotificationSink) -> Self {
        Self {
            filter,
            formatter,
            sink,
            stats: RelayStats::default(),
        }
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    pub fn filter(&self) -> &MentionFilter {
        &self.filter
    }

    /// 处理单条事件，返回推送结果（未推送时为 `None`）
    pub async fn handle_event(&mut self, event: &JetstreamEvent) -> Option<SendResult> {
        self.stats.received += 1;

        let mention = self.filter.evaluate(event)?;
        self.stats.matched += 1;
        debug!(
            collection = %mention.collection,
            author = %mention.author,
            rkey = %mention.rkey,
            time = ?event.time(),
            "Mention received"
        );

        let Some(payload) = self.formatter.format(&mention).await else {
            self.stats.unhandled += 1;
            debug!(collection = %mention.collection, author = %mention.author, "No notification for collection");
            return None;
        };

        let result = self.sink.send(&payload).await;
        self.stats.record(&result);
        Some(result)
    }

    /// 消费事件流直到流结束、出错或收到停止信号
    pub async fn run<S>(&mut self, stream: S, mut stop: watch::Receiver<bool>) -> Result<RelayStats>
    where
        S: Stream<Item = Result<JetstreamEvent>> + Unpin,
    {
        let mut stream = stream;
        let mut stop_open = true;

        info!(target_did = %self.filter.target(), dry_run = self.sink.is_dry_run(), "Relay listening");

        let outcome = loop {
            if *stop.borrow() {
                info!("Stop requested");
                break Ok(());
            }

            tokio::select! {
                biased;
                changed = stop.changed(), if stop_open => {
                    if changed.is_err() {
                        // 发送端已丢弃，之后只靠流结束退出
                        stop_open = false;
                    }
                }
                next = stream.next() => match next {
                    Some(Ok(event)) => {
                        self.handle_event(&event).await;
                    }
                    Some(Err(e)) => break Err(e.context("Event stream failed")),
                    None => {
                        info!("Event stream closed");
                        break Ok(());
                    }
                },
            }
        };

        self.stats.log_summary();
        outcome.map(|_| self.stats.clone())
    }
}

//! Mention Relay CLI
//!
//! 监听 Jetstream 中提及目标身份的事件，并推送到 ntfy

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use mention_relay::atproto::{build_http_client, HttpDidDocumentSource};
use mention_relay::notification::NtfyConfig;
use mention_relay::resolver::AppViewProfileSource;
use mention_relay::{
    stop_signal, EventLoop, JetstreamSubscription, MentionFilter, NotificationFormatter, NotificationPayload,
    NotificationSink, NtfyChannel, PdsLocator, ProfileResolver, RecordResolver, RelayConfig, SendResult,
    TimedCache, XrpcClient,
};

#[derive(Parser)]
#[command(name = "mention-relay")]
#[command(about = "Mention Relay - 把 Bluesky / Tangled 上的提及推送到 ntfy")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/mention-relay/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 覆盖监听的目标 DID
    #[arg(long, global = true)]
    target: Option<String>,
    /// 输出 debug 日志
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 订阅事件流并推送通知，直到流结束或 Ctrl-C
    Listen {
        /// Dry-run 模式（只打印不发送）
        #[arg(long)]
        dry_run: bool,
        /// 从指定时间（微秒）开始回放
        #[arg(long)]
        cursor: Option<i64>,
    },
    /// 解析一个 at:// 引用并输出 record JSON
    Resolve {
        /// at://{did}/{collection}/{rkey}
        uri: String,
    },
    /// 输出 DID 对应的 profile
    Profile {
        did: String,
    },
    /// 发送一条测试通知
    TestNotify {
        /// 通知内容
        #[arg(long, short)]
        message: Option<String>,
        /// Dry-run 模式（只打印不发送）
        #[arg(long)]
        dry_run: bool,
    },
}

/// 共享的 HTTP 依赖
struct Clients {
    http: reqwest::Client,
    xrpc: XrpcClient,
}

impl Clients {
    fn new(config: &RelayConfig) -> Result<Self> {
        let http = build_http_client(config.http_timeout_secs).context("Failed to build HTTP client")?;
        let xrpc = XrpcClient::new(http.clone());
        Ok(Self { http, xrpc })
    }

    fn profile_resolver(&self, config: &RelayConfig) -> ProfileResolver {
        let source = AppViewProfileSource::new(self.xrpc.clone(), config.appview_url.clone());
        ProfileResolver::new(
            Box::new(source),
            TimedCache::new(config.profile_ttl(), config.cache_capacity),
            config.profile_ttl(),
        )
    }

    fn record_resolver(&self, config: &RelayConfig) -> RecordResolver {
        let documents = HttpDidDocumentSource::new(self.http.clone(), config.plc_directory_url.clone());
        let locator = PdsLocator::new(
            Box::new(documents),
            TimedCache::new(config.base_cache_lifetime(), config.cache_capacity),
        );
        RecordResolver::new(
            locator,
            Box::new(self.xrpc.clone()),
            TimedCache::new(config.record_ttl(), config.cache_capacity),
            config.record_ttl(),
        )
    }

    fn sink(&self, config: &RelayConfig, dry_run: bool) -> NotificationSink {
        let channel = NtfyChannel::new(
            self.http.clone(),
            NtfyConfig {
                url: config.ntfy_url.clone(),
            },
        );
        NotificationSink::new(Arc::new(channel)).with_dry_run(dry_run)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "mention_relay=debug"
    } else {
        "mention_relay=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let mut config = RelayConfig::load(cli.config.as_deref())?;
    if let Some(target) = cli.target {
        config.target_did = target;
    }
    config.validate()?;
    debug!(?config, "Configuration loaded");

    let clients = Clients::new(&config)?;

    match cli.command {
        Commands::Listen { dry_run, cursor } => {
            let filter = MentionFilter::new(config.target_did.clone());
            let formatter = NotificationFormatter::new(
                config.target_did.clone(),
                config.links(),
                clients.profile_resolver(&config),
                clients.record_resolver(&config),
            );
            let sink = clients.sink(&config, dry_run);

            let subscription =
                JetstreamSubscription::new(config.jetstream_url.clone(), filter.watched_nsids()).with_cursor(cursor);
            let stream = subscription.connect().await.context("Failed to subscribe to Jetstream")?;

            let (stop, stop_rx) = stop_signal();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-C received, stopping after current event");
                    let _ = stop.send(true);
                }
            });

            let mut relay = EventLoop::new(filter, formatter, sink);
            relay.run(stream, stop_rx).await?;
        }
        Commands::Resolve { uri } => {
            let mut records = clients.record_resolver(&config);
            let value = records
                .resolve(&uri)
                .await
                .with_context(|| format!("Failed to resolve {}", uri))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Profile { did } => {
            let mut profiles = clients.profile_resolver(&config);
            let profile = profiles.resolve(&did).await;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            println!("Display label: {}", profile.display_label());
        }
        Commands::TestNotify { message, dry_run } => {
            let message = message.unwrap_or_else(|| "Test notification from mention-relay".to_string());
            let payload = NotificationPayload::new("Mention Relay", message, config.bsky_url.clone());

            let sink = clients.sink(&config, dry_run);
            match sink.send(&payload).await {
                SendResult::Sent => println!("✅ Sent to {}", config.ntfy_url),
                SendResult::Skipped(reason) => println!("⏭️  Skipped: {}", reason),
                SendResult::Failed(reason) => return Err(anyhow!("Notification failed: {}", reason)),
            }
        }
    }

    Ok(())
}

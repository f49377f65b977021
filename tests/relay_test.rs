//! 端到端测试：事件 → 过滤 → 格式化 → 推送，全部使用内存实现

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mention_relay::atproto::{DidDocument, DidDocumentSource};
use mention_relay::notification::LinkConfig;
use mention_relay::resolver::{ProfileSource, RecordSource};
use mention_relay::{
    stop_signal, ActorProfile, CanonicalUri, EventLoop, JetstreamEvent, ManualClock, MentionFilter,
    NotificationChannel, NotificationFormatter, NotificationPayload, NotificationSink, PdsLocator, Priority,
    ProfileResolver, RecordResolver, ResolveError, ResolveResult, SendResult, TimedCache,
};

const TARGET: &str = "did:plc:target";
const ALICE: &str = "did:plc:alice";
const BOB: &str = "did:plc:bob";
const REPO_URI: &str = "at://did:plc:target/sh.tangled.repo/3kwidgets";
const ISSUE_URI: &str = "at://did:plc:target/sh.tangled.repo.issue/3kissue";

struct Profiles;

#[async_trait]
impl ProfileSource for Profiles {
    async fn fetch_profile(&self, did: &str) -> ResolveResult<ActorProfile> {
        if did != ALICE {
            return Err(ResolveError::Xrpc {
                error: "InvalidRequest".to_string(),
                message: Some("Profile not found".to_string()),
            });
        }
        Ok(ActorProfile {
            did: did.to_string(),
            handle: "alice.test".to_string(),
            display_name: Some("Alice".to_string()),
            avatar: Some("https://cdn.example/alice.jpg".to_string()),
        })
    }
}

struct Documents;

#[async_trait]
impl DidDocumentSource for Documents {
    async fn fetch_document(&self, did: &str) -> ResolveResult<DidDocument> {
        let document = json!({
            "id": did,
            "service": [{
                "id": "#atproto_pds",
                "type": "AtprotoPersonalDataServer",
                "serviceEndpoint": "https://pds.example"
            }]
        });
        Ok(serde_json::from_value(document)?)
    }
}

#[derive(Clone, Default)]
struct Records {
    values: Arc<HashMap<String, Value>>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RecordSource for Records {
    async fn fetch_record(&self, _pds: &str, uri: &CanonicalUri) -> ResolveResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.values
            .get(&uri.to_string())
            .cloned()
            .ok_or_else(|| ResolveError::Xrpc {
                error: "RecordNotFound".to_string(),
                message: Some(format!("Could not locate record: {}", uri)),
            })
    }
}

#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<NotificationPayload>>,
}

impl RecordingChannel {
    fn payloads(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<SendResult> {
        self.sent.lock().unwrap().push(payload.clone());
        Ok(SendResult::Sent)
    }
}

struct Harness {
    relay: EventLoop,
    channel: Arc<RecordingChannel>,
    records: Records,
}

fn harness(values: HashMap<String, Value>, dry_run: bool) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let base = Duration::from_secs(3600);

    let profiles = ProfileResolver::new(
        Box::new(Profiles),
        TimedCache::with_clock(base * 4, 64, clock.clone()),
        base * 4,
    );

    let records = Records {
        values: Arc::new(values),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let locator = PdsLocator::new(Box::new(Documents), TimedCache::with_clock(base, 64, clock.clone()));
    let record_resolver = RecordResolver::new(
        locator,
        Box::new(records.clone()),
        TimedCache::with_clock(base * 24, 64, clock),
        base * 24,
    );

    let formatter = NotificationFormatter::new(TARGET, LinkConfig::default(), profiles, record_resolver);
    let channel = Arc::new(RecordingChannel::default());
    let sink = NotificationSink::new(channel.clone()).with_dry_run(dry_run);

    Harness {
        relay: EventLoop::new(MentionFilter::new(TARGET), formatter, sink),
        channel,
        records,
    }
}

fn widgets_repo() -> HashMap<String, Value> {
    let mut values = HashMap::new();
    values.insert(REPO_URI.to_string(), json!({"name": "widgets", "knot": "knot.example"}));
    values
}

fn reply_ref() -> Value {
    let parent = json!({"uri": format!("at://{}/app.bsky.feed.post/3kroot", TARGET), "cid": "bafy"});
    json!({"root": parent.clone(), "parent": parent})
}

fn mention_facets() -> Value {
    json!([{"features": [{"$type": "app.bsky.richtext.facet#mention", "did": TARGET}]}])
}

async fn deliver(harness: &mut Harness, event: JetstreamEvent) -> Vec<NotificationPayload> {
    harness.relay.handle_event(&event).await;
    harness.channel.payloads()
}

#[tokio::test]
async fn test_reply_post() {
    let mut h = harness(HashMap::new(), false);
    let event = JetstreamEvent::create(
        ALICE,
        "app.bsky.feed.post",
        "3kpost",
        json!({"text": "hello", "reply": reply_ref()}),
    );

    let sent = deliver(&mut h, event).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Bluesky");
    assert_eq!(sent[0].message, "alice.test replied: hello");
    assert_eq!(sent[0].url, "https://bsky.app/profile/did:plc:alice/post/3kpost");
    assert_eq!(sent[0].icon.as_deref(), Some("https://cdn.example/alice.jpg"));
    assert_eq!(sent[0].priority, Priority::Default);
}

#[tokio::test]
async fn test_mention_with_image_embed() {
    let mut h = harness(HashMap::new(), false);
    let event = JetstreamEvent::create(
        ALICE,
        "app.bsky.feed.post",
        "3kpost",
        json!({
            "text": "look at this",
            "facets": mention_facets(),
            "embed": {"$type": "app.bsky.embed.images", "images": []}
        }),
    );

    let sent = deliver(&mut h, event).await;
    assert_eq!(sent[0].message, "alice.test mentioned you: look at this [Image]");
    assert!(sent[0].message.ends_with("[Image]"));
}

#[tokio::test]
async fn test_reply_to_thread_rooted_at_target() {
    let mut h = harness(HashMap::new(), false);
    let reply = json!({
        "root": {"uri": format!("at://{}/app.bsky.feed.post/3kroot", TARGET), "cid": "a"},
        "parent": {"uri": "at://did:plc:carol/app.bsky.feed.post/3kmid", "cid": "b"}
    });
    let event = JetstreamEvent::create(ALICE, "app.bsky.feed.post", "3kpost", json!({"text": "agreed", "reply": reply}));

    let sent = deliver(&mut h, event).await;
    assert_eq!(sent[0].message, "alice.test replied: agreed");
}

#[tokio::test]
async fn test_malformed_embed_keeps_author_text() {
    let mut h = harness(HashMap::new(), false);
    let event = JetstreamEvent::create(
        ALICE,
        "app.bsky.feed.post",
        "3kpost",
        json!({"text": "hello did:plc:target", "embed": {"images": []}}),
    );

    let sent = deliver(&mut h, event).await;
    assert_eq!(sent[0].message, "alice.test mentioned you: hello did:plc:target");
}

#[tokio::test]
async fn test_unknown_embed_type_adds_no_label() {
    let mut h = harness(HashMap::new(), false);
    let event = JetstreamEvent::create(
        ALICE,
        "app.bsky.feed.post",
        "3kpost",
        json!({"text": "see", "facets": mention_facets(), "embed": {"$type": "app.bsky.embed.gallery"}}),
    );

    let sent = deliver(&mut h, event).await;
    assert_eq!(sent[0].message, "alice.test mentioned you: see");
}

#[tokio::test]
async fn test_star_resolves_repo_name() {
    let mut h = harness(widgets_repo(), false);
    let event = JetstreamEvent::create(ALICE, "sh.tangled.feed.star", "3kstar", json!({"subject": REPO_URI}));

    let sent = deliver(&mut h, event).await;
    assert_eq!(sent[0].title, "Tangled");
    assert!(sent[0].message.contains("starred widgets"));
    assert_eq!(sent[0].priority.level(), 2);
    assert_eq!(sent[0].url, "https://tangled.sh/@did:plc:alice");
}

#[tokio::test]
async fn test_repeated_star_uses_record_cache() {
    let mut h = harness(widgets_repo(), false);
    for rkey in ["3kstar1", "3kstar2"] {
        let event = JetstreamEvent::create(ALICE, "sh.tangled.feed.star", rkey, json!({"subject": REPO_URI}));
        h.relay.handle_event(&event).await;
    }

    assert_eq!(h.channel.payloads().len(), 2);
    assert_eq!(h.records.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_comment_on_unresolvable_issue() {
    let mut h = harness(widgets_repo(), false);
    let event = JetstreamEvent::create(
        BOB,
        "sh.tangled.repo.issue.comment",
        "3kcomment",
        json!({"issue": ISSUE_URI, "body": "+1"}),
    );

    let sent = deliver(&mut h, event).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].message.contains("Repository not found"));
    assert_eq!(
        sent[0].message,
        "did:plc:bob commented on issue \"Repository not found\", on Repository not found: +1"
    );
}

#[tokio::test]
async fn test_comment_on_resolved_issue() {
    let mut values = widgets_repo();
    values.insert(ISSUE_URI.to_string(), json!({"repo": REPO_URI, "title": "Crash on start"}));
    let mut h = harness(values, false);

    let event = JetstreamEvent::create(
        ALICE,
        "sh.tangled.repo.issue.comment",
        "3kcomment",
        json!({"issue": ISSUE_URI, "body": "same here"}),
    );

    let sent = deliver(&mut h, event).await;
    assert_eq!(
        sent[0].message,
        "alice.test commented on issue \"Crash on start\", on widgets: same here"
    );
}

#[tokio::test]
async fn test_issue_opened() {
    let mut h = harness(widgets_repo(), false);
    let event = JetstreamEvent::create(
        ALICE,
        "sh.tangled.repo.issue",
        "3kissue",
        json!({"repo": REPO_URI, "title": "Crash", "body": "steps to reproduce"}),
    );

    let sent = deliver(&mut h, event).await;
    assert_eq!(
        sent[0].message,
        "alice.test opened an issue, \"Crash\", on widgets: steps to reproduce"
    );
    assert_eq!(sent[0].url, "https://tangled.sh");
}

#[tokio::test]
async fn test_follows_and_verification() {
    let mut h = harness(HashMap::new(), false);

    let follow = JetstreamEvent::create(ALICE, "app.bsky.graph.follow", "3kf", json!({"subject": TARGET}));
    let verification = JetstreamEvent::create(
        ALICE,
        "app.bsky.graph.verification",
        "3kv",
        json!({"subject": TARGET, "handle": "target.test"}),
    );
    let tangled = JetstreamEvent::create(ALICE, "sh.tangled.graph.follow", "3kt", json!({"subject": TARGET}));

    for event in [follow, verification, tangled] {
        h.relay.handle_event(&event).await;
    }

    let sent = h.channel.payloads();
    assert_eq!(sent.len(), 3);

    assert_eq!(sent[0].message, "alice.test followed you");
    assert_eq!(sent[0].url, "https://bsky.app/profile/did:plc:alice");

    assert_eq!(sent[1].message, "alice.test verified you");
    assert_eq!(sent[1].url, "https://pdsls.dev/at://did:plc:alice/app.bsky.graph.verification/3kv");

    assert_eq!(sent[2].title, "Tangled");
    assert_eq!(sent[2].url, "https://tangled.sh/@did:plc:alice");
    assert!(sent.iter().all(|p| p.priority == Priority::Low));
}

#[tokio::test]
async fn test_stream_run_in_order_with_dry_run() {
    let mut h = harness(widgets_repo(), true);
    let (_stop, stop_rx) = stop_signal();

    let events = vec![
        Ok(JetstreamEvent::create(ALICE, "app.bsky.feed.post", "3k1", json!({"text": "hi", "reply": reply_ref()}))),
        Ok(JetstreamEvent::create(TARGET, "app.bsky.feed.post", "3k2", json!({"text": TARGET}))),
        Ok(JetstreamEvent::create(ALICE, "sh.tangled.feed.star", "3k3", json!({"subject": REPO_URI}))),
    ];

    let stats = h.relay.run(futures::stream::iter(events), stop_rx).await.unwrap();
    assert_eq!(stats.received, 3);
    assert_eq!(stats.matched, 2);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.sent, 0);
    assert!(h.channel.payloads().is_empty());
}

//! 实时私信服务单元测试。
//!
//! 覆盖校验、持久化-推送一致性、线程视图新鲜度和已读回执。

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use domain::{DomainError, Timestamp};
use tokio::sync::mpsc;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::memory::InMemoryMessageRepository;
use crate::registry::{ConnectionRegistry, LocalConnectionRegistry, PushEvent};
use crate::services::chat_service::{ChatService, ChatServiceDependencies, SendMessageRequest};

const OWNER: &str = "owner@example.com";
const ADOPTER: &str = "adopter@example.com";

/// 每次取值步进一秒的时钟，保证测试内时间戳严格递增。
struct StepClock {
    step: AtomicI64,
}

impl StepClock {
    fn new() -> Self {
        Self {
            step: AtomicI64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Timestamp {
        let step = self.step.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(step)
    }
}

struct Fixture {
    service: ChatService,
    registry: Arc<LocalConnectionRegistry>,
}

fn fixture() -> Fixture {
    let registry = Arc::new(LocalConnectionRegistry::new());
    let service = ChatService::new(ChatServiceDependencies {
        message_repository: Arc::new(InMemoryMessageRepository::new()),
        registry: registry.clone(),
        clock: Arc::new(StepClock::new()),
    });
    Fixture { service, registry }
}

fn send(from: &str, to: &str, content: &str) -> SendMessageRequest {
    SendMessageRequest {
        from_email: from.to_owned(),
        to_email: to.to_owned(),
        content: content.to_owned(),
    }
}

fn user(raw: &str) -> domain::UserId {
    domain::UserId::parse(raw).unwrap()
}

#[tokio::test]
async fn send_rejects_blank_content() {
    let fx = fixture();
    let err = fx.service.send(send(OWNER, ADOPTER, "   ")).await.unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidArgument { .. })
    ));

    // 校验失败不落库
    assert!(fx
        .service
        .history(OWNER.to_owned(), ADOPTER.to_owned())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn send_trims_content_before_storing() {
    let fx = fixture();
    let dto = fx
        .service
        .send(send(OWNER, ADOPTER, "  Interested in a meet?  "))
        .await
        .unwrap();
    assert_eq!(dto.content, "Interested in a meet?");
}

#[tokio::test]
async fn pushed_payload_matches_stored_history() {
    let fx = fixture();
    let (tx, mut rx) = mpsc::unbounded_channel();
    fx.registry.register(user(ADOPTER), tx).await;

    let sent = fx
        .service
        .send(send(OWNER, ADOPTER, "Interested in a meet?"))
        .await
        .unwrap();

    let PushEvent::ReceiveMessage { message: pushed } = rx.recv().await.unwrap();
    assert_eq!(pushed, sent);

    let history = fx
        .service
        .history(OWNER.to_owned(), ADOPTER.to_owned())
        .await
        .unwrap();
    assert_eq!(history, vec![pushed]);
}

#[tokio::test]
async fn both_participants_receive_the_push() {
    let fx = fixture();
    let (owner_tx, mut owner_rx) = mpsc::unbounded_channel();
    let (adopter_tx, mut adopter_rx) = mpsc::unbounded_channel();
    fx.registry.register(user(OWNER), owner_tx).await;
    fx.registry.register(user(ADOPTER), adopter_tx).await;

    fx.service.send(send(OWNER, ADOPTER, "hello")).await.unwrap();

    assert!(owner_rx.recv().await.is_some());
    assert!(adopter_rx.recv().await.is_some());
}

#[tokio::test]
async fn every_device_of_a_participant_receives_the_push() {
    let fx = fixture();
    let (tab1, mut rx1) = mpsc::unbounded_channel();
    let (tab2, mut rx2) = mpsc::unbounded_channel();
    fx.registry.register(user(ADOPTER), tab1).await;
    fx.registry.register(user(ADOPTER), tab2).await;

    fx.service.send(send(OWNER, ADOPTER, "hello")).await.unwrap();

    assert!(rx1.recv().await.is_some());
    assert!(rx2.recv().await.is_some());
}

#[tokio::test]
async fn offline_recipient_is_not_an_error() {
    let fx = fixture();
    fx.service.send(send(OWNER, ADOPTER, "anyone home?")).await.unwrap();

    // 消息已经落库，下次拉历史能看到
    let history = fx
        .service
        .history(ADOPTER.to_owned(), OWNER.to_owned())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn closed_channel_does_not_fail_send() {
    let fx = fixture();
    let (tx, rx) = mpsc::unbounded_channel();
    fx.registry.register(user(ADOPTER), tx).await;
    drop(rx); // 对端已断开但尚未注销

    assert!(fx.service.send(send(OWNER, ADOPTER, "still works")).await.is_ok());
}

#[tokio::test]
async fn history_is_ascending_across_interleaved_senders() {
    let fx = fixture();
    fx.service.send(send(OWNER, ADOPTER, "1")).await.unwrap();
    fx.service.send(send(ADOPTER, OWNER, "2")).await.unwrap();
    fx.service.send(send(OWNER, ADOPTER, "3")).await.unwrap();

    let history = fx
        .service
        .history(ADOPTER.to_owned(), OWNER.to_owned())
        .await
        .unwrap();
    let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["1", "2", "3"]);
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn history_ignores_other_conversations() {
    let fx = fixture();
    fx.service.send(send(OWNER, ADOPTER, "ours")).await.unwrap();
    fx.service
        .send(send(OWNER, "other@example.com", "theirs"))
        .await
        .unwrap();

    let history = fx
        .service
        .history(OWNER.to_owned(), ADOPTER.to_owned())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "ours");
}

#[tokio::test]
async fn threads_reflect_latest_send_immediately() {
    let fx = fixture();
    fx.service.send(send(OWNER, ADOPTER, "hi")).await.unwrap();

    let threads = fx.service.threads(OWNER.to_owned()).await.unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].counterpart_id, ADOPTER);
    assert_eq!(threads[0].last_message, "hi");
}

#[tokio::test]
async fn threads_sorted_by_recency_one_entry_per_counterpart() {
    let fx = fixture();
    fx.service.send(send(OWNER, ADOPTER, "first")).await.unwrap();
    fx.service
        .send(send(OWNER, "third@example.com", "second"))
        .await
        .unwrap();
    fx.service.send(send(ADOPTER, OWNER, "third")).await.unwrap();

    let threads = fx.service.threads(OWNER.to_owned()).await.unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].counterpart_id, ADOPTER);
    assert_eq!(threads[0].last_message, "third");
    assert_eq!(threads[1].counterpart_id, "third@example.com");
}

#[tokio::test]
async fn mark_read_flips_only_the_addressed_direction() {
    let fx = fixture();
    fx.service.send(send(OWNER, ADOPTER, "a")).await.unwrap();
    fx.service.send(send(OWNER, ADOPTER, "b")).await.unwrap();
    fx.service.send(send(ADOPTER, OWNER, "c")).await.unwrap();

    let updated = fx
        .service
        .mark_read(OWNER.to_owned(), ADOPTER.to_owned())
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let history = fx
        .service
        .history(OWNER.to_owned(), ADOPTER.to_owned())
        .await
        .unwrap();
    let read_flags: Vec<_> = history.iter().map(|m| (m.content.as_str(), m.read)).collect();
    assert_eq!(read_flags, vec![("a", true), ("b", true), ("c", false)]);

    // 再次标记没有剩余未读
    let again = fx
        .service
        .mark_read(OWNER.to_owned(), ADOPTER.to_owned())
        .await
        .unwrap();
    assert_eq!(again, 0);
}

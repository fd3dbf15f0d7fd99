//! 实时私信服务。
//!
//! 发送路径：校验 → 持久化 → 线程视图可读 → 尽力推送到双方的
//! 活跃连接。推送的消息体与历史接口返回的是同一个 DTO 序列化，
//! 没有独立的"实时版"表示。收件人不在线只是跳过推送，不是错误。

use std::sync::Arc;

use domain::{Message, MessageContent, MessageId, UserId};
use uuid::Uuid;

use crate::clock::Clock;
use crate::dto::{MessageDto, ThreadDto};
use crate::error::ApplicationError;
use crate::registry::{ConnectionRegistry, PushEvent};
use crate::repository::MessageRepository;

/// 历史读取的单页大小。HTTP 契约仍是全量历史，
/// 但每次底层查询有界。
const HISTORY_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub from_email: String,
    pub to_email: String,
    pub content: String,
}

pub struct ChatServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发送一条消息。内容去空白后必须非空；持久化成功后把落库
    /// 副本推给双方身份名下的所有连接。
    pub async fn send(&self, request: SendMessageRequest) -> Result<MessageDto, ApplicationError> {
        let from_id = UserId::parse(request.from_email)?;
        let to_id = UserId::parse(request.to_email)?;
        let content = MessageContent::parse(request.content)?;

        let message = Message::new(
            MessageId::from(Uuid::new_v4()),
            from_id.clone(),
            to_id.clone(),
            content,
            self.deps.clock.now(),
        );

        let persisted = self.deps.message_repository.append(message).await?;
        let dto = MessageDto::from(&persisted);

        self.push_to(&from_id, &dto).await;
        if to_id != from_id {
            self.push_to(&to_id, &dto).await;
        }

        Ok(dto)
    }

    /// 线程视图：每个对端一条，按最近消息时间降序。
    /// 直接读消息存储，与 `send` 写入的是同一份数据。
    pub async fn threads(&self, user_id: String) -> Result<Vec<ThreadDto>, ApplicationError> {
        let user_id = UserId::parse(user_id)?;
        let entries = self.deps.message_repository.threads(&user_id).await?;
        Ok(entries.iter().map(ThreadDto::from).collect())
    }

    /// 两个身份之间的全量历史，按 created_at 升序。
    /// 底层按页拉取拼接，避免单次无界查询。
    pub async fn history(
        &self,
        user1: String,
        user2: String,
    ) -> Result<Vec<MessageDto>, ApplicationError> {
        let a = UserId::parse(user1)?;
        let b = UserId::parse(user2)?;

        let mut all = Vec::new();
        let mut after = None;
        loop {
            let page = self
                .deps
                .message_repository
                .conversation_page(&a, &b, after, HISTORY_PAGE_SIZE)
                .await?;
            let full_page = page.len() as u32 == HISTORY_PAGE_SIZE;
            after = page.last().map(|message| message.id);
            all.extend(page.iter().map(MessageDto::from));
            if !full_page {
                break;
            }
        }
        Ok(all)
    }

    /// 把 from → to 方向的消息全部标记已读，返回更新条数。
    pub async fn mark_read(&self, from: String, to: String) -> Result<u64, ApplicationError> {
        let from = UserId::parse(from)?;
        let to = UserId::parse(to)?;
        Ok(self.deps.message_repository.mark_read(&from, &to).await?)
    }

    /// 尽力推送：身份没有活跃连接时什么都不做；单个连接的发送
    /// 失败（对端正在断开）只记日志。
    async fn push_to(&self, user_id: &UserId, dto: &MessageDto) {
        let channels = self.deps.registry.channels_for(user_id).await;
        for channel in channels {
            let event = PushEvent::ReceiveMessage {
                message: dto.clone(),
            };
            if channel.send(event).is_err() {
                tracing::debug!(user = %user_id, "push skipped: channel closed");
            }
        }
    }
}

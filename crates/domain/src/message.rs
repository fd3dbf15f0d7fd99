use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageContent, MessageId, Timestamp, UserId};

/// 私信消息。追加写入，会话内按 created_at 升序排列。
///
/// 两个身份即确定一个会话，不存在单独的会话实体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from_id: UserId,
    pub to_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
    pub read: bool,
}

impl Message {
    pub fn new(
        id: MessageId,
        from_id: UserId,
        to_id: UserId,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            from_id,
            to_id,
            content,
            created_at,
            read: false,
        }
    }

    /// 给定会话一方，返回另一方的身份。
    /// 自己发给自己的消息（允许，原始数据里存在）返回对方即本人。
    pub fn counterpart_of(&self, user: &UserId) -> &UserId {
        if &self.from_id == user {
            &self.to_id
        } else {
            &self.from_id
        }
    }

    /// 该消息是否属于 (a, b) 这对无序身份组成的会话。
    pub fn belongs_to(&self, a: &UserId, b: &UserId) -> bool {
        (&self.from_id == a && &self.to_id == b) || (&self.from_id == b && &self.to_id == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn message(from: &str, to: &str) -> Message {
        Message::new(
            MessageId::from(Uuid::new_v4()),
            UserId::parse(from).unwrap(),
            UserId::parse(to).unwrap(),
            MessageContent::parse("hi").unwrap(),
            chrono::Utc::now(),
        )
    }

    #[test]
    fn counterpart_resolves_both_directions() {
        let msg = message("owner@example.com", "adopter@example.com");
        let owner = UserId::parse("owner@example.com").unwrap();
        let adopter = UserId::parse("adopter@example.com").unwrap();
        assert_eq!(msg.counterpart_of(&owner), &adopter);
        assert_eq!(msg.counterpart_of(&adopter), &owner);
    }

    #[test]
    fn belongs_to_is_symmetric() {
        let msg = message("a@x", "b@x");
        let a = UserId::parse("a@x").unwrap();
        let b = UserId::parse("b@x").unwrap();
        let c = UserId::parse("c@x").unwrap();
        assert!(msg.belongs_to(&a, &b));
        assert!(msg.belongs_to(&b, &a));
        assert!(!msg.belongs_to(&a, &c));
    }

    #[test]
    fn new_message_starts_unread() {
        assert!(!message("a@x", "b@x").read);
    }
}

//! 内存仓储实现。
//!
//! `InMemoryDeckRepository` 是卡片栈的默认生产实现：栈本来就是
//! 进程内状态，重启即丢（多实例部署需替换为网络缓存）。其余三个
//! 实现服务于单元测试和无数据库的本地运行模式。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    DeckCard, Favorite, ListingId, Message, MessageId, RepositoryError, UserDeck, UserId,
};
use tokio::sync::RwLock;

use crate::repository::{
    DeckRepository, FavoriteOutcome, FavoriteRepository, ListingRepository, MessageRepository,
    ThreadEntry,
};

/// 进程内卡片栈存储：用户 → 栈 的并发 map。
#[derive(Clone, Default)]
pub struct InMemoryDeckRepository {
    decks: Arc<RwLock<HashMap<UserId, UserDeck>>>,
}

impl InMemoryDeckRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeckRepository for InMemoryDeckRepository {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserDeck>, RepositoryError> {
        Ok(self.decks.read().await.get(user_id).cloned())
    }

    async fn put(&self, deck: UserDeck) -> Result<(), RepositoryError> {
        self.decks.write().await.insert(deck.user_id.clone(), deck);
        Ok(())
    }

    async fn remove(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        self.decks.write().await.remove(user_id);
        Ok(())
    }
}

/// 内存候选帖子源。
#[derive(Clone, Default)]
pub struct InMemoryListingRepository {
    cards: Arc<RwLock<Vec<DeckCard>>>,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, card: DeckCard) {
        self.cards.write().await.push(card);
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn list_active(&self) -> Result<Vec<DeckCard>, RepositoryError> {
        let cards = self.cards.read().await;
        let mut active: Vec<DeckCard> = cards
            .iter()
            .filter(|card| !card.pet.adopted)
            .cloned()
            .collect();
        domain::deck::order_candidates(&mut active);
        Ok(active)
    }
}

/// 内存收藏存储。唯一性约束在插入时检查。
#[derive(Clone, Default)]
pub struct InMemoryFavoriteRepository {
    favorites: Arc<RwLock<HashMap<UserId, Vec<Favorite>>>>,
}

impl InMemoryFavoriteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryFavoriteRepository {
    async fn add(&self, favorite: Favorite) -> Result<FavoriteOutcome, RepositoryError> {
        let mut favorites = self.favorites.write().await;
        let entries = favorites.entry(favorite.user_id.clone()).or_default();
        if entries.iter().any(|entry| entry.listing_id == favorite.listing_id) {
            return Ok(FavoriteOutcome::AlreadyExists);
        }
        entries.push(favorite);
        Ok(FavoriteOutcome::Inserted)
    }

    async fn list_ids(&self, user_id: &UserId) -> Result<Vec<ListingId>, RepositoryError> {
        Ok(self
            .favorites
            .read()
            .await
            .get(user_id)
            .map(|entries| entries.iter().map(|entry| entry.listing_id).collect())
            .unwrap_or_default())
    }

    async fn remove(&self, user_id: &UserId, listing_id: ListingId) -> Result<(), RepositoryError> {
        let mut favorites = self.favorites.write().await;
        let entries = favorites.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        let before = entries.len();
        entries.retain(|entry| entry.listing_id != listing_id);
        if entries.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// 内存消息存储。追加写入，读路径上排序。
#[derive(Clone, Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: Message) -> Result<Message, RepositoryError> {
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn conversation_page(
        &self,
        a: &UserId,
        b: &UserId,
        after: Option<MessageId>,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut conversation: Vec<Message> = messages
            .iter()
            .filter(|message| message.belongs_to(a, b))
            .cloned()
            .collect();
        // 稳定排序：时间相同时保留写入顺序
        conversation.sort_by_key(|message| message.created_at);

        let start = match after {
            Some(id) => conversation
                .iter()
                .position(|message| message.id == id)
                .map(|index| index + 1)
                .unwrap_or(conversation.len()),
            None => 0,
        };
        Ok(conversation
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect())
    }

    async fn threads(&self, user_id: &UserId) -> Result<Vec<ThreadEntry>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut latest: HashMap<UserId, &Message> = HashMap::new();
        for message in messages.iter() {
            if &message.from_id != user_id && &message.to_id != user_id {
                continue;
            }
            let counterpart = message.counterpart_of(user_id).clone();
            let replace = latest
                .get(&counterpart)
                .map(|current| current.created_at <= message.created_at)
                .unwrap_or(true);
            if replace {
                latest.insert(counterpart, message);
            }
        }

        let mut entries: Vec<ThreadEntry> = latest
            .into_iter()
            .map(|(counterpart_id, message)| ThreadEntry {
                counterpart_id,
                last_message: message.content.to_string(),
                last_date: message.created_at,
            })
            .collect();
        entries.sort_by(|a, b| b.last_date.cmp(&a.last_date));
        Ok(entries)
    }

    async fn mark_read(&self, from: &UserId, to: &UserId) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.write().await;
        let mut updated = 0;
        for message in messages.iter_mut() {
            if &message.from_id == from && &message.to_id == to && !message.read {
                message.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

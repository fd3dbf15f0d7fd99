use async_trait::async_trait;
use domain::{
    DeckCard, Favorite, ListingId, Message, MessageId, RepositoryError, Timestamp, UserDeck,
    UserId,
};

/// 收藏插入结果。重复插入不是错误，调用方按需把它当作幂等空操作
/// 或显式冲突处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteOutcome {
    Inserted,
    AlreadyExists,
}

/// 线程聚合条目：某个对话对端及其最近一条消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub counterpart_id: UserId,
    pub last_message: String,
    pub last_date: Timestamp,
}

/// 候选帖子源（只读）。
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// 返回全部在架领养帖子（已联结宠物信息），最新在前。
    async fn list_active(&self) -> Result<Vec<DeckCard>, RepositoryError>;
}

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// 插入收藏；(user, listing) 已存在时返回 `AlreadyExists`，不报错。
    async fn add(&self, favorite: Favorite) -> Result<FavoriteOutcome, RepositoryError>;

    /// 该用户收藏的全部帖子标识。
    async fn list_ids(&self, user_id: &UserId) -> Result<Vec<ListingId>, RepositoryError>;

    /// 删除收藏；不存在时返回 `RepositoryError::NotFound`。
    async fn remove(&self, user_id: &UserId, listing_id: ListingId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 持久化消息并返回落库后的完整实体（含生成的标识）。
    async fn append(&self, message: Message) -> Result<Message, RepositoryError>;

    /// 无序身份对 (a, b) 的会话分页，按 created_at 升序。
    /// `after` 为上一页最后一条消息的标识，None 表示从头开始。
    async fn conversation_page(
        &self,
        a: &UserId,
        b: &UserId,
        after: Option<MessageId>,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// 每个对端一条的线程聚合，按最近消息时间降序。
    async fn threads(&self, user_id: &UserId) -> Result<Vec<ThreadEntry>, RepositoryError>;

    /// 把 from → to 方向的未读消息全部标记已读，返回更新条数。
    async fn mark_read(&self, from: &UserId, to: &UserId) -> Result<u64, RepositoryError>;
}

/// 卡片栈存储。默认实现是进程内并发 map；多实例部署可以换成
/// 网络缓存，服务层不感知。
#[async_trait]
pub trait DeckRepository: Send + Sync {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserDeck>, RepositoryError>;
    /// 整体替换该用户的栈。
    async fn put(&self, deck: UserDeck) -> Result<(), RepositoryError>;
    async fn remove(&self, user_id: &UserId) -> Result<(), RepositoryError>;
}

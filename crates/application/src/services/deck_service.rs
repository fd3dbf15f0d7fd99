//! 滑卡栈服务。
//!
//! 管理每个用户的卡片栈生命周期：按需构建/重建、滑动消费、
//! 右滑转收藏的幂等副作用，以及补货水位信号。同一用户的栈操作
//! 串行执行，不同用户互不争用。

use std::collections::HashMap;
use std::sync::Arc;

use config::DeckConfig;
use domain::{DomainError, Favorite, ListingId, SwipeDirection, UserDeck, UserId};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::clock::Clock;
use crate::dto::{DeckDto, SwipeResultDto};
use crate::error::ApplicationError;
use crate::repository::{DeckRepository, FavoriteOutcome, FavoriteRepository, ListingRepository};

#[derive(Debug, Clone)]
pub struct SwipeRequest {
    pub user_id: String,
    pub card_id: Uuid,
    pub direction: SwipeDirection,
}

pub struct DeckServiceDependencies {
    pub listing_repository: Arc<dyn ListingRepository>,
    pub favorite_repository: Arc<dyn FavoriteRepository>,
    pub deck_repository: Arc<dyn DeckRepository>,
    pub clock: Arc<dyn Clock>,
    pub config: DeckConfig,
}

pub struct DeckService {
    deps: DeckServiceDependencies,
    /// 按用户分键的串行化锁。跨键无争用。
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl DeckService {
    pub fn new(deps: DeckServiceDependencies) -> Self {
        Self {
            deps,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        // 只剩 map 自己持有的条目已经闲置，顺手回收
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(user_id.clone()).or_default().clone()
    }

    #[cfg(test)]
    pub(crate) async fn user_lock_count(&self) -> usize {
        self.user_locks.lock().await.len()
    }

    /// 返回用户当前的卡片栈，必要时（无栈、强制刷新、已到补货水位）
    /// 先整体重建。候选集为空时存一个空栈返回，不算错误。
    pub async fn get_deck(
        &self,
        user_id: String,
        force_refresh: bool,
    ) -> Result<DeckDto, ApplicationError> {
        let user_id = UserId::parse(user_id)?;
        let lock = self.lock_for(&user_id).await;
        let _guard = lock.lock().await;

        let existing = self.deps.deck_repository.get(&user_id).await?;
        let deck = match existing {
            Some(deck)
                if !force_refresh && !deck.should_replenish(self.deps.config.low_water) =>
            {
                deck
            }
            _ => {
                let deck = self.rebuild(&user_id).await?;
                self.deps.deck_repository.put(deck.clone()).await?;
                deck
            }
        };

        Ok(DeckDto::from_deck(&deck, self.deps.config.low_water))
    }

    /// 消费一次滑动。栈的移除先于收藏写入落盘；收藏写入失败不回滚
    /// 滑动，以免把用户已经做过决定的卡片重新端上来。
    pub async fn swipe(&self, request: SwipeRequest) -> Result<SwipeResultDto, ApplicationError> {
        let user_id = UserId::parse(request.user_id)?;
        let listing_id = ListingId::from(request.card_id);
        let lock = self.lock_for(&user_id).await;
        let _guard = lock.lock().await;

        let mut deck = self
            .deps
            .deck_repository
            .get(&user_id)
            .await?
            .ok_or(DomainError::NoActiveDeck)?;

        deck.take_card(listing_id)?;
        self.deps.deck_repository.put(deck.clone()).await?;

        let added_to_favorites = if request.direction.is_like() {
            self.try_add_favorite(&user_id, listing_id).await
        } else {
            false
        };

        Ok(SwipeResultDto {
            remaining_cards: deck.remaining(),
            should_restack: deck.should_replenish(self.deps.config.low_water),
            added_to_favorites,
        })
    }

    /// 显式收藏入口。与滑动路径不同，这里的重复收藏要让调用方
    /// 看到冲突，而不是静默成功。
    pub async fn add_favorite(
        &self,
        user_id: String,
        listing_id: Uuid,
    ) -> Result<(), ApplicationError> {
        let user_id = UserId::parse(user_id)?;
        let favorite = Favorite::new(user_id, ListingId::from(listing_id), self.deps.clock.now());
        match self.deps.favorite_repository.add(favorite).await? {
            FavoriteOutcome::Inserted => Ok(()),
            FavoriteOutcome::AlreadyExists => Err(DomainError::FavoriteExists.into()),
        }
    }

    /// 该用户收藏的全部帖子标识。
    pub async fn list_favorites(&self, user_id: String) -> Result<Vec<Uuid>, ApplicationError> {
        let user_id = UserId::parse(user_id)?;
        let ids = self.deps.favorite_repository.list_ids(&user_id).await?;
        Ok(ids.into_iter().map(Uuid::from).collect())
    }

    /// 取消收藏。被取消的帖子要等到下一次重建才会重新进入栈。
    pub async fn remove_favorite(
        &self,
        user_id: String,
        listing_id: Uuid,
    ) -> Result<(), ApplicationError> {
        let user_id = UserId::parse(user_id)?;
        match self
            .deps
            .favorite_repository
            .remove(&user_id, ListingId::from(listing_id))
            .await
        {
            Ok(()) => Ok(()),
            Err(domain::RepositoryError::NotFound) => Err(DomainError::FavoriteNotFound.into()),
            Err(err) => Err(err.into()),
        }
    }

    /// 重建栈：全部在架帖子减去该用户已收藏的帖子，取前 N 张。
    async fn rebuild(&self, user_id: &UserId) -> Result<UserDeck, ApplicationError> {
        let candidates = self.deps.listing_repository.list_active().await?;
        let favorited = self.deps.favorite_repository.list_ids(user_id).await?;

        let available: Vec<_> = candidates
            .into_iter()
            .filter(|card| !favorited.contains(&card.listing_id()))
            .collect();

        Ok(UserDeck::build(
            user_id.clone(),
            available,
            self.deps.config.size,
            self.deps.clock.now(),
        ))
    }

    /// 右滑转收藏。重复收藏是幂等空操作；存储故障降级为
    /// `added_to_favorites=false`，滑动本身照常完成。
    async fn try_add_favorite(&self, user_id: &UserId, listing_id: ListingId) -> bool {
        let favorite = Favorite::new(user_id.clone(), listing_id, self.deps.clock.now());
        match self.deps.favorite_repository.add(favorite).await {
            Ok(FavoriteOutcome::Inserted) => true,
            Ok(FavoriteOutcome::AlreadyExists) => {
                tracing::debug!(user = %user_id, listing = %listing_id, "favorite already exists");
                false
            }
            Err(err) => {
                tracing::warn!(
                    user = %user_id,
                    listing = %listing_id,
                    error = %err,
                    "favorite write failed, swipe still consumed"
                );
                false
            }
        }
    }
}

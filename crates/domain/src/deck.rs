use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::listing::DeckCard;
use crate::value_objects::{ListingId, Timestamp, UserId};

/// 单个用户的滑卡栈。
///
/// 不变式：
/// 1. 构建时已收藏的帖子不会进入栈；
/// 2. 条目按标识移除且从不回插；
/// 3. 栈只整体重建，从不增量合并。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDeck {
    pub user_id: UserId,
    pub cards: Vec<DeckCard>,
    pub built_at: Timestamp,
}

impl UserDeck {
    /// 从候选集构建新栈。调用方负责先排除已收藏的帖子；
    /// 这里做确定性排序并截断到 `size`。
    pub fn build(
        user_id: UserId,
        mut candidates: Vec<DeckCard>,
        size: usize,
        built_at: Timestamp,
    ) -> Self {
        order_candidates(&mut candidates);
        candidates.truncate(size);
        Self {
            user_id,
            cards: candidates,
            built_at,
        }
    }

    /// 按标识取出一张卡。找不到返回 [`DomainError::CardNotInDeck`]，
    /// 且不影响其余条目——客户端展示过期卡片属于正常竞态。
    pub fn take_card(&mut self, listing_id: ListingId) -> Result<DeckCard, DomainError> {
        let index = self
            .cards
            .iter()
            .position(|card| card.listing_id() == listing_id)
            .ok_or(DomainError::CardNotInDeck)?;
        Ok(self.cards.remove(index))
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// 剩余卡片数是否已触及补货水位。
    pub fn should_replenish(&self, low_water: usize) -> bool {
        self.cards.len() <= low_water
    }

    pub fn contains(&self, listing_id: ListingId) -> bool {
        self.cards.iter().any(|card| card.listing_id() == listing_id)
    }
}

/// 候选卡确定性排序：最新帖子在前，时间相同时按帖子标识升序。
/// 两次无干预的重建必须得到相同顺序。
pub fn order_candidates(candidates: &mut [DeckCard]) {
    candidates.sort_by(|a, b| {
        b.listing
            .created_at
            .cmp(&a.listing.created_at)
            .then_with(|| a.listing.id.cmp(&b.listing.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Listing, PetProfile};
    use crate::value_objects::PetId;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn card(age_secs: i64, id: Uuid) -> DeckCard {
        let pet_id = PetId::from(Uuid::new_v4());
        DeckCard {
            listing: Listing {
                id: ListingId::from(id),
                pet_id,
                owner_id: UserId::parse("owner@example.com").unwrap(),
                title: "Sunny boy".to_owned(),
                description: "Loves walks".to_owned(),
                image_urls: vec![],
                created_at: Utc::now() - Duration::seconds(age_secs),
            },
            pet: PetProfile {
                id: pet_id,
                name: "Rex".to_owned(),
                species: "dog".to_owned(),
                breed: "mixed".to_owned(),
                age_months: 18,
                vaccinated: true,
                adopted: false,
            },
        }
    }

    fn deck(cards: Vec<DeckCard>) -> UserDeck {
        UserDeck::build(
            UserId::parse("adopter@example.com").unwrap(),
            cards,
            10,
            Utc::now(),
        )
    }

    #[test]
    fn build_orders_newest_first() {
        let old = card(100, Uuid::new_v4());
        let new = card(1, Uuid::new_v4());
        let deck = deck(vec![old.clone(), new.clone()]);
        assert_eq!(deck.cards[0].listing_id(), new.listing_id());
        assert_eq!(deck.cards[1].listing_id(), old.listing_id());
    }

    #[test]
    fn build_breaks_timestamp_ties_by_id() {
        let mut a = card(0, Uuid::from_u128(1));
        let mut b = card(0, Uuid::from_u128(2));
        let shared = Utc::now();
        a.listing.created_at = shared;
        b.listing.created_at = shared;

        let forward = deck(vec![a.clone(), b.clone()]);
        let reversed = deck(vec![b, a]);
        assert_eq!(forward.cards, reversed.cards);
        assert_eq!(forward.cards[0].listing.id, ListingId::from(Uuid::from_u128(1)));
    }

    #[test]
    fn build_truncates_to_size() {
        let cards: Vec<_> = (0..15).map(|i| card(i, Uuid::new_v4())).collect();
        let deck = deck(cards);
        assert_eq!(deck.remaining(), 10);
    }

    #[test]
    fn take_card_removes_exactly_one() {
        let victim = card(5, Uuid::new_v4());
        let other = card(6, Uuid::new_v4());
        let mut deck = deck(vec![victim.clone(), other.clone()]);
        let taken = deck.take_card(victim.listing_id()).unwrap();
        assert_eq!(taken.listing_id(), victim.listing_id());
        assert_eq!(deck.remaining(), 1);
        assert!(deck.contains(other.listing_id()));
    }

    #[test]
    fn take_card_missing_leaves_deck_intact() {
        let only = card(5, Uuid::new_v4());
        let mut deck = deck(vec![only]);
        let err = deck.take_card(ListingId::from(Uuid::new_v4())).unwrap_err();
        assert_eq!(err, DomainError::CardNotInDeck);
        assert_eq!(deck.remaining(), 1);
    }

    #[test]
    fn replenish_boundary_is_inclusive() {
        let cards: Vec<_> = (0..5).map(|i| card(i, Uuid::new_v4())).collect();
        let mut deck = deck(cards);
        assert!(!deck.should_replenish(4)); // 剩 5 张不触发
        let first = deck.cards[0].listing_id();
        deck.take_card(first).unwrap();
        assert!(deck.should_replenish(4)); // 剩 4 张触发
    }
}

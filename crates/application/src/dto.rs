//! 对外数据传输对象。
//!
//! 字段命名与原有客户端约定保持一致（camelCase）。推送给长连接的
//! 消息体与 HTTP 历史接口返回的是同一个 `MessageDto` 序列化结果，
//! 保证"已存副本 == 推送副本"。

use domain::{DeckCard, Message, Timestamp, UserDeck};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::ThreadEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetDto {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age_months: u32,
    pub vaccinated: bool,
    pub adopted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub created_at: Timestamp,
    pub pet_info: PetDto,
}

impl From<&DeckCard> for CardDto {
    fn from(card: &DeckCard) -> Self {
        Self {
            id: card.listing.id.into(),
            pet_id: card.listing.pet_id.into(),
            owner_id: card.listing.owner_id.to_string(),
            title: card.listing.title.clone(),
            description: card.listing.description.clone(),
            image_urls: card.listing.image_urls.clone(),
            created_at: card.listing.created_at,
            pet_info: PetDto {
                id: card.pet.id.into(),
                name: card.pet.name.clone(),
                species: card.pet.species.clone(),
                breed: card.pet.breed.clone(),
                age_months: card.pet.age_months,
                vaccinated: card.pet.vaccinated,
                adopted: card.pet.adopted,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckDto {
    pub cards: Vec<CardDto>,
    pub remaining_cards: usize,
    pub should_restack: bool,
}

impl DeckDto {
    pub fn from_deck(deck: &UserDeck, low_water: usize) -> Self {
        Self {
            cards: deck.cards.iter().map(CardDto::from).collect(),
            remaining_cards: deck.remaining(),
            should_restack: deck.should_replenish(low_water),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResultDto {
    pub remaining_cards: usize,
    pub should_restack: bool,
    pub added_to_favorites: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub from_email: String,
    pub to_email: String,
    pub content: String,
    pub created_at: Timestamp,
    pub read: bool,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.into(),
            from_email: message.from_id.to_string(),
            to_email: message.to_id.to_string(),
            content: message.content.to_string(),
            created_at: message.created_at,
            read: message.read,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDto {
    pub counterpart_id: String,
    pub last_message: String,
    pub last_date: Timestamp,
}

impl From<&ThreadEntry> for ThreadDto {
    fn from(entry: &ThreadEntry) -> Self {
        Self {
            counterpart_id: entry.counterpart_id.to_string(),
            last_message: entry.last_message.clone(),
            last_date: entry.last_date,
        }
    }
}

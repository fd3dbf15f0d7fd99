use serde::{Deserialize, Serialize};

use crate::value_objects::{ListingId, PetId, Timestamp, UserId};

/// 领养帖子。
///
/// 卡片栈只读取帖子，从不修改；写入路径（发布、下架、图片上传）
/// 属于外部协作方。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub pet_id: PetId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub created_at: Timestamp,
}

/// 读取时联结进卡片的宠物属性（反范式化）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetProfile {
    pub id: PetId,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age_months: u32,
    pub vaccinated: bool,
    pub adopted: bool,
}

/// 卡片栈条目：帖子加上联结后的宠物信息。
///
/// 仅存在于进程内存中，随栈重建而整体替换，从不持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCard {
    pub listing: Listing,
    pub pet: PetProfile,
}

impl DeckCard {
    pub fn listing_id(&self) -> ListingId {
        self.listing.id
    }
}

use serde::{Deserialize, Serialize};

use crate::value_objects::{ListingId, Timestamp, UserId};

/// 收藏关系：用户对某个领养帖子的持久化 like。
///
/// 不变式：每个 (user_id, listing_id) 至多一条，重复插入由仓储层
/// 识别并当作幂等空操作处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: UserId,
    pub listing_id: ListingId,
    pub created_at: Timestamp,
}

impl Favorite {
    pub fn new(user_id: UserId, listing_id: ListingId, created_at: Timestamp) -> Self {
        Self {
            user_id,
            listing_id,
            created_at,
        }
    }
}

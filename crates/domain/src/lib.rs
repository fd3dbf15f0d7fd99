//! 领域模型层。
//!
//! 定义宠物领养配对核心的实体与值对象：领养帖子、卡片栈、
//! 收藏关系和私信消息。该层不做任何 I/O，所有持久化与推送
//! 由外层通过仓储接口接入。

pub mod deck;
pub mod errors;
pub mod favorite;
pub mod listing;
pub mod message;
pub mod value_objects;

pub use deck::UserDeck;
pub use errors::{DomainError, RepositoryError};
pub use favorite::Favorite;
pub use listing::{DeckCard, Listing, PetProfile};
pub use message::Message;
pub use value_objects::{
    ListingId, MessageContent, MessageId, PetId, SwipeDirection, Timestamp, UserId,
};

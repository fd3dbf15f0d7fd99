//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、副作用顺序、
//! 以及对外部适配器（候选帖子源、收藏存储、消息存储、推送通道）的抽象。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod registry;
pub mod repository;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use dto::{CardDto, DeckDto, MessageDto, PetDto, SwipeResultDto, ThreadDto};
pub use error::ApplicationError;
pub use memory::{
    InMemoryDeckRepository, InMemoryFavoriteRepository, InMemoryListingRepository,
    InMemoryMessageRepository,
};
pub use registry::{
    ChannelSender, ConnectionId, ConnectionRegistry, LocalConnectionRegistry, PushEvent,
};
pub use repository::{
    DeckRepository, FavoriteOutcome, FavoriteRepository, ListingRepository, MessageRepository,
    ThreadEntry,
};
pub use services::{
    ChatService, ChatServiceDependencies, DeckService, DeckServiceDependencies, SendMessageRequest,
    SwipeRequest,
};

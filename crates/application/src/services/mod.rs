pub mod chat_service;
pub mod deck_service;

pub use chat_service::{ChatService, ChatServiceDependencies, SendMessageRequest};
pub use deck_service::{DeckService, DeckServiceDependencies, SwipeRequest};

#[cfg(test)]
mod chat_service_tests;

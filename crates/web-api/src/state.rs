use std::sync::Arc;

use application::{ChatService, ConnectionRegistry, DeckService};

#[derive(Clone)]
pub struct AppState {
    pub deck_service: Arc<DeckService>,
    pub chat_service: Arc<ChatService>,
    pub registry: Arc<dyn ConnectionRegistry>,
}

impl AppState {
    pub fn new(
        deck_service: Arc<DeckService>,
        chat_service: Arc<ChatService>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            deck_service,
            chat_service,
            registry,
        }
    }
}

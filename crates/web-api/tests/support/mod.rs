//! 集成测试支撑：在随机端口上拉起内存后端的完整服务。

use std::net::SocketAddr;
use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, Clock, DeckService, DeckServiceDependencies,
    InMemoryDeckRepository, InMemoryFavoriteRepository, InMemoryListingRepository,
    InMemoryMessageRepository, LocalConnectionRegistry, SystemClock,
};
use chrono::{Duration, TimeZone, Utc};
use config::DeckConfig;
use domain::{DeckCard, Listing, ListingId, PetId, PetProfile, UserId};
use uuid::Uuid;
use web_api::{router, AppState};

pub struct TestApp {
    pub addr: SocketAddr,
    pub listings: Arc<InMemoryListingRepository>,
    pub favorites: Arc<InMemoryFavoriteRepository>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

pub async fn spawn_app() -> TestApp {
    let listings = Arc::new(InMemoryListingRepository::new());
    let favorites = Arc::new(InMemoryFavoriteRepository::new());
    let registry = Arc::new(LocalConnectionRegistry::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let deck_service = DeckService::new(DeckServiceDependencies {
        listing_repository: listings.clone(),
        favorite_repository: favorites.clone(),
        deck_repository: Arc::new(InMemoryDeckRepository::new()),
        clock: clock.clone(),
        config: DeckConfig::default(),
    });
    let chat_service = ChatService::new(ChatServiceDependencies {
        message_repository: Arc::new(InMemoryMessageRepository::new()),
        registry: registry.clone(),
        clock,
    });

    let state = AppState::new(
        Arc::new(deck_service),
        Arc::new(chat_service),
        registry,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.expect("serve");
    });

    TestApp {
        addr,
        listings,
        favorites,
    }
}

pub fn card(offset_secs: i64, id: u128) -> DeckCard {
    let pet_id = PetId::from(Uuid::new_v4());
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    DeckCard {
        listing: Listing {
            id: ListingId::from(Uuid::from_u128(id)),
            pet_id,
            owner_id: UserId::parse("owner@example.com").unwrap(),
            title: format!("listing-{id}"),
            description: "friendly".to_owned(),
            image_urls: vec!["https://cdn.example.com/rex.jpg".to_owned()],
            created_at: base + Duration::seconds(offset_secs),
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

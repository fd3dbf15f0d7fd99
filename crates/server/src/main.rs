//! 主应用程序入口
//!
//! 启动 Axum Web API 服务。

use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, DeckService, DeckServiceDependencies,
    InMemoryDeckRepository, InMemoryFavoriteRepository, InMemoryListingRepository,
    InMemoryMessageRepository, LocalConnectionRegistry, SystemClock,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, PgFavoriteRepository, PgListingRepository, PgMessageRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env();

    let listing_repository: Arc<dyn application::ListingRepository>;
    let favorite_repository: Arc<dyn application::FavoriteRepository>;
    let message_repository: Arc<dyn application::MessageRepository>;

    match &config.database.url {
        Some(url) => {
            tracing::info!("连接数据库: {}", url.split('@').next_back().unwrap_or("unknown"));
            let pool = create_pg_pool(url, config.database.max_connections).await?;
            sqlx::migrate!("../../migrations").run(&pool).await?;

            listing_repository = Arc::new(PgListingRepository::new(pool.clone()));
            favorite_repository = Arc::new(PgFavoriteRepository::new(pool.clone()));
            message_repository = Arc::new(PgMessageRepository::new(pool));
        }
        None => {
            tracing::warn!("DATABASE_URL 未设置，使用内存存储（数据不落盘，仅限本地联调）");
            listing_repository = Arc::new(InMemoryListingRepository::new());
            favorite_repository = Arc::new(InMemoryFavoriteRepository::new());
            message_repository = Arc::new(InMemoryMessageRepository::new());
        }
    }

    let clock: Arc<dyn application::Clock> = Arc::new(SystemClock);
    let registry = Arc::new(LocalConnectionRegistry::new());

    let deck_service = DeckService::new(DeckServiceDependencies {
        listing_repository,
        favorite_repository,
        deck_repository: Arc::new(InMemoryDeckRepository::new()),
        clock: clock.clone(),
        config: config.deck,
    });

    let chat_service = ChatService::new(ChatServiceDependencies {
        message_repository,
        registry: registry.clone(),
        clock,
    });

    let state = AppState::new(
        Arc::new(deck_service),
        Arc::new(chat_service),
        registry,
    );

    let app = router(state);
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;

    tracing::info!(
        "pawmatch 服务器启动在 http://{}:{}",
        config.server.host,
        config.server.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}

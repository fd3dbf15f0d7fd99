use application::repository::{
    FavoriteOutcome, FavoriteRepository, ListingRepository, MessageRepository, ThreadEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    DeckCard, Favorite, Listing, ListingId, Message, MessageContent, MessageId, PetId, PetProfile,
    RepositoryError, UserId,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

pub async fn create_pg_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

#[derive(Debug, FromRow)]
struct CardRecord {
    id: Uuid,
    pet_id: Uuid,
    owner_id: String,
    title: String,
    description: String,
    image_urls: Vec<String>,
    created_at: DateTime<Utc>,
    pet_name: String,
    species: String,
    breed: String,
    age_months: i32,
    vaccinated: bool,
    adopted: bool,
}

impl TryFrom<CardRecord> for DeckCard {
    type Error = RepositoryError;

    fn try_from(value: CardRecord) -> Result<Self, Self::Error> {
        let owner_id =
            UserId::parse(value.owner_id).map_err(|err| invalid_data(err.to_string()))?;
        let pet_id = PetId::from(value.pet_id);
        Ok(DeckCard {
            listing: Listing {
                id: ListingId::from(value.id),
                pet_id,
                owner_id,
                title: value.title,
                description: value.description,
                image_urls: value.image_urls,
                created_at: value.created_at,
            },
            pet: PetProfile {
                id: pet_id,
                name: value.pet_name,
                species: value.species,
                breed: value.breed,
                age_months: value.age_months.max(0) as u32,
                vaccinated: value.vaccinated,
                adopted: value.adopted,
            },
        })
    }
}

/// 候选帖子源的 PostgreSQL 实现：帖子联结宠物，最新在前。
pub struct PgListingRepository {
    pool: PgPool,
}

impl PgListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingRepository for PgListingRepository {
    async fn list_active(&self) -> Result<Vec<DeckCard>, RepositoryError> {
        let records: Vec<CardRecord> = sqlx::query_as(
            r#"
            SELECT l.id, l.pet_id, l.owner_id, l.title, l.description,
                   l.image_urls, l.created_at,
                   p.name AS pet_name, p.species, p.breed, p.age_months,
                   p.vaccinated, p.adopted
            FROM listings l
            JOIN pets p ON p.id = l.pet_id
            WHERE NOT p.adopted
            ORDER BY l.created_at DESC, l.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(DeckCard::try_from).collect()
    }
}

/// 收藏存储的 PostgreSQL 实现。唯一性由 (user_id, listing_id)
/// 主键保证，重复插入通过 ON CONFLICT 识别为幂等空操作。
pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn add(&self, favorite: Favorite) -> Result<FavoriteOutcome, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, listing_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, listing_id) DO NOTHING
            "#,
        )
        .bind(favorite.user_id.as_str())
        .bind(Uuid::from(favorite.listing_id))
        .bind(favorite.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            Ok(FavoriteOutcome::AlreadyExists)
        } else {
            Ok(FavoriteOutcome::Inserted)
        }
    }

    async fn list_ids(&self, user_id: &UserId) -> Result<Vec<ListingId>, RepositoryError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT listing_id FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(rows.into_iter().map(|(id,)| ListingId::from(id)).collect())
    }

    async fn remove(&self, user_id: &UserId, listing_id: ListingId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id.as_str())
            .bind(Uuid::from(listing_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    from_id: String,
    to_id: String,
    content: String,
    created_at: DateTime<Utc>,
    read: bool,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let from_id = UserId::parse(value.from_id).map_err(|err| invalid_data(err.to_string()))?;
        let to_id = UserId::parse(value.to_id).map_err(|err| invalid_data(err.to_string()))?;
        let content =
            MessageContent::parse(value.content).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Message {
            id: MessageId::from(value.id),
            from_id,
            to_id,
            content,
            created_at: value.created_at,
            read: value.read,
        })
    }
}

#[derive(Debug, FromRow)]
struct ThreadRecord {
    counterpart_id: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ThreadRecord> for ThreadEntry {
    type Error = RepositoryError;

    fn try_from(value: ThreadRecord) -> Result<Self, Self::Error> {
        let counterpart_id =
            UserId::parse(value.counterpart_id).map_err(|err| invalid_data(err.to_string()))?;
        Ok(ThreadEntry {
            counterpart_id,
            last_message: value.content,
            last_date: value.created_at,
        })
    }
}

/// 消息存储的 PostgreSQL 实现。追加写入；会话查询按
/// (created_at, id) 升序，线程聚合用 DISTINCT ON（与原有文档
/// 存储里的聚合管道等价）。
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, message: Message) -> Result<Message, RepositoryError> {
        let record: MessageRecord = sqlx::query_as(
            r#"
            INSERT INTO messages (id, from_id, to_id, content, created_at, "read")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, from_id, to_id, content, created_at, "read"
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(message.from_id.as_str())
        .bind(message.to_id.as_str())
        .bind(message.content.as_str())
        .bind(message.created_at)
        .bind(message.read)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn conversation_page(
        &self,
        a: &UserId,
        b: &UserId,
        after: Option<MessageId>,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let records: Vec<MessageRecord> = sqlx::query_as(
            r#"
            SELECT id, from_id, to_id, content, created_at, "read"
            FROM messages
            WHERE ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1))
              AND ($3::uuid IS NULL
                   OR (created_at, id) > (SELECT created_at, id FROM messages WHERE id = $3))
            ORDER BY created_at ASC, id ASC
            LIMIT $4
            "#,
        )
        .bind(a.as_str())
        .bind(b.as_str())
        .bind(after.map(Uuid::from))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn threads(&self, user_id: &UserId) -> Result<Vec<ThreadEntry>, RepositoryError> {
        let records: Vec<ThreadRecord> = sqlx::query_as(
            r#"
            SELECT counterpart_id, content, created_at FROM (
                SELECT DISTINCT ON (counterpart_id)
                       CASE WHEN from_id = $1 THEN to_id ELSE from_id END AS counterpart_id,
                       content, created_at
                FROM messages
                WHERE from_id = $1 OR to_id = $1
                ORDER BY counterpart_id, created_at DESC, id DESC
            ) latest
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(ThreadEntry::try_from).collect()
    }

    async fn mark_read(&self, from: &UserId, to: &UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE messages SET "read" = TRUE WHERE from_id = $1 AND to_id = $2 AND NOT "read""#,
        )
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }
}

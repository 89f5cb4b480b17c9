use chrono::{DateTime, Utc};
use futures_core::future::BoxFuture;
use sqlx::sqlite::SqlitePool;
pub use sqlx::Error;
use sqlx::{query, query_as, query_scalar};
use teloxide::types::ChatId;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UserRecord {
    pub chat_id: i64,
    pub first_name: String,
    pub city: String,
    pub registered_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn chat_id(&self) -> ChatId {
        ChatId(self.chat_id)
    }
}

/// Persistent user records, keyed by chat.
pub trait UserStore: Send + Sync {
    fn get_users(&self) -> BoxFuture<'_, Result<Vec<UserRecord>, Error>>;

    fn get_user_by_chat_id(&self, chat_id: ChatId)
        -> BoxFuture<'_, Result<Option<UserRecord>, Error>>;

    /// Returns `None` if a record for this chat already exists.
    fn create_user<'a>(
        &'a self,
        chat_id: ChatId,
        first_name: &'a str,
        city: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, Error>>;

    /// Returns `None` if there was nothing to delete.
    fn delete_user(&self, chat_id: ChatId) -> BoxFuture<'_, Result<Option<UserRecord>, Error>>;
}

/// Holds the weather provider credential.
pub trait AdminStore: Send + Sync {
    fn get_api_key(&self) -> BoxFuture<'_, Result<Option<String>, Error>>;
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(database_url).await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, Error> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn get_users(&self) -> Result<Vec<UserRecord>, Error> {
        query_as("SELECT chat_id, first_name, city, registered_at FROM users")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn get_user_by_chat_id(&self, chat_id: ChatId) -> Result<Option<UserRecord>, Error> {
        query_as("SELECT chat_id, first_name, city, registered_at FROM users WHERE chat_id = ?")
            .bind(chat_id.0)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create_user(
        &self,
        chat_id: ChatId,
        first_name: &str,
        city: &str,
    ) -> Result<Option<UserRecord>, Error> {
        query_as(
            "INSERT INTO users (chat_id, first_name, city, registered_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(chat_id) DO NOTHING
            RETURNING chat_id, first_name, city, registered_at",
        )
        .bind(chat_id.0)
        .bind(first_name)
        .bind(city)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_user(&self, chat_id: ChatId) -> Result<Option<UserRecord>, Error> {
        query_as(
            "DELETE FROM users WHERE chat_id = ?
            RETURNING chat_id, first_name, city, registered_at",
        )
        .bind(chat_id.0)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_api_key(&self) -> Result<Option<String>, Error> {
        query_scalar("SELECT api_key FROM admin WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<(), Error> {
        query(
            "INSERT INTO admin (id, api_key) VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET api_key = ?1",
        )
        .bind(api_key)
        .execute(&self.pool)
        .await
        .map(|_| ())
    }
}

impl UserStore for Database {
    fn get_users(&self) -> BoxFuture<'_, Result<Vec<UserRecord>, Error>> {
        Box::pin(Database::get_users(self))
    }

    fn get_user_by_chat_id(
        &self,
        chat_id: ChatId,
    ) -> BoxFuture<'_, Result<Option<UserRecord>, Error>> {
        Box::pin(Database::get_user_by_chat_id(self, chat_id))
    }

    fn create_user<'a>(
        &'a self,
        chat_id: ChatId,
        first_name: &'a str,
        city: &'a str,
    ) -> BoxFuture<'a, Result<Option<UserRecord>, Error>> {
        Box::pin(Database::create_user(self, chat_id, first_name, city))
    }

    fn delete_user(&self, chat_id: ChatId) -> BoxFuture<'_, Result<Option<UserRecord>, Error>> {
        Box::pin(Database::delete_user(self, chat_id))
    }
}

impl AdminStore for Database {
    fn get_api_key(&self) -> BoxFuture<'_, Result<Option<String>, Error>> {
        Box::pin(Database::get_api_key(self))
    }
}

use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{contains_pattern, rooms};

#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub room_id: String,
    pub body: String,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
}

/// A message joined with its author and room.
#[derive(Debug, Clone, FromRow)]
pub struct MessageListing {
    pub id: String,
    pub body: String,
    pub created: OffsetDateTime,
    pub user_id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub room_id: String,
    pub room_name: String,
}

const LISTING: &str = "SELECT m.id, m.body, m.created, m.user_id, u.username, u.avatar, \
    m.room_id, r.name AS room_name \
    FROM messages m JOIN users u ON u.id = m.user_id JOIN rooms r ON r.id = m.room_id";

const NEWEST_FIRST: &str = "ORDER BY julianday(m.created) DESC, m.rowid DESC";

/// Stores a message and makes its author a participant of the room.
pub async fn post(db_pool: &SqlitePool, room_id: &str, user_id: &str, body: &str) -> Result<Message, sqlx::Error> {
    let mut tx = db_pool.begin().await?;

    let now = OffsetDateTime::now_utc();
    let message = sqlx::query_as(
        "INSERT INTO messages (id,user_id,room_id,body,created,updated) VALUES (?,?,?,?,?,?) RETURNING *",
    )
        .bind(Uuid::now_v7().to_string())
        .bind(user_id)
        .bind(room_id)
        .bind(body)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
    rooms::add_participant(&mut *tx, room_id, user_id).await?;

    tx.commit().await?;
    Ok(message)
}

/// Fails with `RowNotFound` when there is no such message.
pub async fn get(db_pool: &SqlitePool, id: &str) -> Result<Message, sqlx::Error> {
    sqlx::query_as("SELECT * FROM messages WHERE id=?")
        .bind(id)
        .fetch_one(db_pool)
        .await
}

pub async fn delete(db_pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM messages WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn in_room(db_pool: &SqlitePool, room_id: &str) -> Result<Vec<MessageListing>, sqlx::Error> {
    sqlx::query_as(&format!("{LISTING} WHERE m.room_id=? {NEWEST_FIRST}"))
        .bind(room_id)
        .fetch_all(db_pool)
        .await
}

/// Newest messages posted in rooms whose topic name contains `q`.
pub async fn recent_by_topic(db_pool: &SqlitePool, q: &str, limit: i64) -> Result<Vec<MessageListing>, sqlx::Error> {
    sqlx::query_as(&format!(
        r"{LISTING} JOIN topics t ON t.id = r.topic_id
        WHERE t.name LIKE ? ESCAPE '\'
        {NEWEST_FIRST} LIMIT ?"
    ))
        .bind(contains_pattern(q))
        .bind(limit)
        .fetch_all(db_pool)
        .await
}

pub async fn by_user(db_pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<MessageListing>, sqlx::Error> {
    sqlx::query_as(&format!("{LISTING} WHERE m.user_id=? {NEWEST_FIRST} LIMIT ?"))
        .bind(user_id)
        .bind(limit)
        .fetch_all(db_pool)
        .await
}

pub async fn all(db_pool: &SqlitePool) -> Result<Vec<MessageListing>, sqlx::Error> {
    sqlx::query_as(&format!("{LISTING} {NEWEST_FIRST}"))
        .fetch_all(db_pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    #[tokio::test]
    async fn posting_joins_the_room_once() {
        let db_pool = testing::pool().await;
        let ann = testing::user(&db_pool, "ann").await;
        let bob = testing::user(&db_pool, "bob").await;
        let room = testing::room(&db_pool, &ann, "Rust", "borrowck").await;

        post(&db_pool, &room.id, &bob.id, "hi").await.unwrap();
        post(&db_pool, &room.id, &bob.id, "hi").await.unwrap();

        let participants = rooms::participants(&db_pool, &room.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].id, bob.id);
        assert_eq!(in_room(&db_pool, &room.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let db_pool = testing::pool().await;
        let ann = testing::user(&db_pool, "ann").await;
        let room = testing::room(&db_pool, &ann, "Rust", "borrowck").await;

        for body in ["one", "two", "three"] {
            post(&db_pool, &room.id, &ann.id, body).await.unwrap();
        }

        let bodies: Vec<_> = all(&db_pool).await.unwrap().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, ["three", "two", "one"]);

        let latest = by_user(&db_pool, &ann.id, 2).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].body, "three");
        assert_eq!(latest[0].room_name, "borrowck");
    }

    #[tokio::test]
    async fn recent_filters_on_topic_name() {
        let db_pool = testing::pool().await;
        let ann = testing::user(&db_pool, "ann").await;
        let rust = testing::room(&db_pool, &ann, "Rust", "borrowck").await;
        let python = testing::room(&db_pool, &ann, "Python", "asyncio").await;
        post(&db_pool, &rust.id, &ann.id, "lifetimes").await.unwrap();
        post(&db_pool, &python.id, &ann.id, "await").await.unwrap();

        let rusty = recent_by_topic(&db_pool, "rust", 10).await.unwrap();
        assert_eq!(rusty.len(), 1);
        assert_eq!(rusty[0].body, "lifetimes");
        assert_eq!(recent_by_topic(&db_pool, "", 10).await.unwrap().len(), 2);
        assert_eq!(recent_by_topic(&db_pool, "", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_room_removes_its_messages() {
        let db_pool = testing::pool().await;
        let ann = testing::user(&db_pool, "ann").await;
        let room = testing::room(&db_pool, &ann, "Rust", "borrowck").await;
        let message = post(&db_pool, &room.id, &ann.id, "gone soon").await.unwrap();

        rooms::delete(&db_pool, &room.id).await.unwrap();

        assert!(all(&db_pool).await.unwrap().is_empty());
        assert!(matches!(get(&db_pool, &message.id).await, Err(sqlx::Error::RowNotFound)));
        assert!(rooms::participants(&db_pool, &room.id).await.unwrap().is_empty());
    }
}

use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::contains_pattern;

#[derive(Debug, Clone, FromRow)]
pub struct Topic {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct TopicSummary {
    pub id: String,
    pub name: String,
    pub room_count: i64,
}

/// Resolves `name` to its topic, inserting it first if it has never been seen.
///
/// Names compare exactly, so `Rust` and `rust` are different topics.
pub async fn get_or_create<'e>(db: impl SqliteExecutor<'e>, name: &str) -> Result<Topic, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO topics (id,name) VALUES (?,?) \
         ON CONFLICT(name) DO UPDATE SET name=excluded.name \
         RETURNING id,name",
    )
        .bind(Uuid::now_v7().to_string())
        .bind(name)
        .fetch_one(db)
        .await
}

/// Topics whose name contains `q`, in creation order, with how many rooms use each.
pub async fn matching(db_pool: &SqlitePool, q: &str, limit: Option<i64>) -> Result<Vec<TopicSummary>, sqlx::Error> {
    sqlx::query_as(
        r"SELECT t.id, t.name, (SELECT COUNT(*) FROM rooms r WHERE r.topic_id = t.id) AS room_count
        FROM topics t
        WHERE t.name LIKE ? ESCAPE '\'
        ORDER BY t.rowid
        LIMIT ?",
    )
        .bind(contains_pattern(q))
        .bind(limit.unwrap_or(-1))
        .fetch_all(db_pool)
        .await
}

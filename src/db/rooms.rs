use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{contains_pattern, topics, User};

#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: String,
    pub host_id: String,
    pub topic_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
}

/// A room joined with what listings show about it.
#[derive(Debug, Clone, FromRow)]
pub struct RoomListing {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created: OffsetDateTime,
    pub updated: OffsetDateTime,
    pub host_id: String,
    pub host_username: String,
    pub host_avatar: Option<String>,
    pub topic_name: String,
    pub participant_count: i64,
}

/// Editable room fields; `topic` is a topic name, resolved on write.
pub struct RoomFields {
    pub topic: String,
    pub name: String,
    pub description: Option<String>,
}

const LISTING: &str = "SELECT r.id, r.name, r.description, r.created, r.updated, \
    r.host_id, u.username AS host_username, u.avatar AS host_avatar, t.name AS topic_name, \
    (SELECT COUNT(*) FROM room_participants p WHERE p.room_id = r.id) AS participant_count \
    FROM rooms r JOIN users u ON u.id = r.host_id JOIN topics t ON t.id = r.topic_id";

// julianday() parses every timestamp layout sqlx writes; the text itself does not sort.
const ORDER: &str = "ORDER BY julianday(r.updated) DESC, julianday(r.created) DESC, r.rowid DESC";

pub async fn create(db_pool: &SqlitePool, host_id: &str, fields: RoomFields) -> Result<Room, sqlx::Error> {
    let mut tx = db_pool.begin().await?;

    let topic = topics::get_or_create(&mut *tx, &fields.topic).await?;
    let now = OffsetDateTime::now_utc();
    let room = sqlx::query_as(
        "INSERT INTO rooms (id,host_id,topic_id,name,description,created,updated) VALUES (?,?,?,?,?,?,?) RETURNING *",
    )
        .bind(Uuid::now_v7().to_string())
        .bind(host_id)
        .bind(&topic.id)
        .bind(fields.name)
        .bind(fields.description)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(room)
}

/// Fails with `RowNotFound` when there is no such room.
pub async fn get(db_pool: &SqlitePool, id: &str) -> Result<Room, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rooms WHERE id=?")
        .bind(id)
        .fetch_one(db_pool)
        .await
}

/// Fails with `RowNotFound` when there is no such room.
pub async fn get_listing(db_pool: &SqlitePool, id: &str) -> Result<RoomListing, sqlx::Error> {
    sqlx::query_as(&format!("{LISTING} WHERE r.id=?"))
        .bind(id)
        .fetch_one(db_pool)
        .await
}

/// Overwrites the topic, name and description of room `id`. The host never changes.
pub async fn update(db_pool: &SqlitePool, id: &str, fields: RoomFields) -> Result<Room, sqlx::Error> {
    let mut tx = db_pool.begin().await?;

    let topic = topics::get_or_create(&mut *tx, &fields.topic).await?;
    let room = sqlx::query_as("UPDATE rooms SET topic_id=?, name=?, description=?, updated=? WHERE id=? RETURNING *")
        .bind(&topic.id)
        .bind(fields.name)
        .bind(fields.description)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(room)
}

/// Deletes the room together with its messages and participant entries.
pub async fn delete(db_pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM rooms WHERE id=?")
        .bind(id)
        .execute(db_pool)
        .await?;
    Ok(())
}

/// Rooms whose topic name, name, description or host username contains `q`, ignoring case.
pub async fn search(db_pool: &SqlitePool, q: &str) -> Result<Vec<RoomListing>, sqlx::Error> {
    let pattern = contains_pattern(q);
    sqlx::query_as(&format!(
        r"{LISTING}
        WHERE t.name LIKE ? ESCAPE '\'
            OR r.name LIKE ? ESCAPE '\'
            OR r.description LIKE ? ESCAPE '\'
            OR u.username LIKE ? ESCAPE '\'
        {ORDER}"
    ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(db_pool)
        .await
}

pub async fn hosted_by(db_pool: &SqlitePool, user_id: &str) -> Result<Vec<RoomListing>, sqlx::Error> {
    sqlx::query_as(&format!("{LISTING} WHERE r.host_id=? {ORDER}"))
        .bind(user_id)
        .fetch_all(db_pool)
        .await
}

pub async fn count_all(db_pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms")
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}

pub async fn participants(db_pool: &SqlitePool, room_id: &str) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as(
        "SELECT u.* FROM users u JOIN room_participants p ON p.user_id = u.id WHERE p.room_id=? ORDER BY u.username",
    )
        .bind(room_id)
        .fetch_all(db_pool)
        .await
}

/// Adds `user_id` to the room's participants; already being one is not an error.
pub async fn add_participant<'e>(db: impl SqliteExecutor<'e>, room_id: &str, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO room_participants (room_id,user_id) VALUES (?,?) ON CONFLICT DO NOTHING")
        .bind(room_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

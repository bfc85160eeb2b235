use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: String,
    pub created: OffsetDateTime,
}

pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

pub struct ProfileFields {
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    /// `None` keeps the current avatar.
    pub avatar: Option<String>,
}

pub async fn create(db_pool: &SqlitePool, new: NewUser) -> Result<User, sqlx::Error> {
    let id = Uuid::now_v7();

    sqlx::query_as("INSERT INTO users (id,name,username,email,password_hash,created) VALUES (?,?,?,?,?,?) RETURNING *")
        .bind(id.to_string())
        .bind(new.name)
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db_pool)
        .await
}

/// Fails with `RowNotFound` when there is no such user.
pub async fn get(db_pool: &SqlitePool, id: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id=?")
        .bind(id)
        .fetch_one(db_pool)
        .await
}

pub async fn find(db_pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id=?")
        .bind(id)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_by_email(db_pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email=?")
        .bind(email)
        .fetch_optional(db_pool)
        .await
}

pub async fn update_profile(db_pool: &SqlitePool, id: &str, fields: ProfileFields) -> Result<User, sqlx::Error> {
    sqlx::query_as(
        "UPDATE users SET name=?, username=?, email=?, bio=?, avatar=COALESCE(?, avatar) WHERE id=? RETURNING *",
    )
        .bind(fields.name)
        .bind(fields.username)
        .bind(fields.email)
        .bind(fields.bio)
        .bind(fields.avatar)
        .bind(id)
        .fetch_one(db_pool)
        .await
}

pub mod messages;
pub mod rooms;
pub mod topics;
pub mod users;

use std::str::FromStr;

use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, SqlitePool};

pub use messages::{Message, MessageListing};
pub use rooms::{Room, RoomListing};
pub use topics::{Topic, TopicSummary};
pub use users::User;

/// Opens a pool on `url`, creating the database file when missing, and applies migrations.
///
/// `sqlite::memory:` databases live only as long as their connection, so callers using
/// them should pass `max_connections = 1`.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;

    Ok(db_pool)
}

/// Turns free text into a `LIKE` pattern matching it as a literal substring.
pub(crate) fn contains_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|e| e.is_unique_violation())
}

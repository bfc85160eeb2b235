use tower_sessions::Session;

use crate::AppResult;

pub const USER_ID: &str = "user_id";
pub const FLASH: &str = "flash";

/// Queues a message for the next rendered page.
pub async fn flash(session: &Session, message: impl Into<String>) -> AppResult<()> {
    let mut flashes = session.get::<Vec<String>>(FLASH).await?.unwrap_or_default();
    flashes.push(message.into());
    session.insert(FLASH, flashes).await?;
    Ok(())
}

/// Removes and returns every queued flash message.
pub async fn take_flashes(session: &Session) -> AppResult<Vec<String>> {
    Ok(session.remove::<Vec<String>>(FLASH).await?.unwrap_or_default())
}

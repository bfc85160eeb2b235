mod login;
mod logout;
pub mod password;
mod register;

use axum::{routing::get, Router};
use tower_sessions::Session;

use crate::{db::User, session::USER_ID, AppResult, AppState};

pub use login::{login, login_page};
pub use logout::logout;
pub use register::{register, register_page};
pub(crate) use register::{valid_email, valid_username};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", get(logout::logout))
        .route("/register", get(register::register_page).post(register::register))
}

/// Binds `user` to a fresh session id.
pub(crate) async fn sign_in(session: &Session, user: &User) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_ID, &user.id).await?;
    Ok(())
}

/// Only local paths are followed after login.
pub(crate) fn return_to(return_url: Option<&str>) -> &str {
    match return_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") => url,
        _ => "/",
    }
}

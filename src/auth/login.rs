use axum::{debug_handler, extract::{Query, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    db, identity::Viewer, session,
    templates::{render, LoginRegisterTemplate, Nav},
    AppResult, AppState,
};

use super::{password::Hasher, return_to, sign_in};

#[derive(Deserialize)]
pub struct LoginQuery {
    pub return_url: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    return_url: Option<String>,
}

async fn login_form(viewer: &Viewer, return_url: Option<String>, email: String) -> AppResult<Response> {
    render(LoginRegisterTemplate {
        nav: Nav::new(&viewer.session, viewer.user.as_ref()).await?,
        page: "login",
        return_url: return_url.unwrap_or_default(),
        name: String::new(),
        username: String::new(),
        email,
    })
}

#[debug_handler(state = AppState)]
pub async fn login_page(
    viewer: Viewer,
    Query(LoginQuery { return_url }): Query<LoginQuery>,
) -> AppResult<Response> {
    if viewer.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    login_form(&viewer, return_url, String::new()).await
}

#[debug_handler(state = AppState)]
pub async fn login(
    viewer: Viewer,
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    Form(LoginForm { email, password, return_url }): Form<LoginForm>,
) -> AppResult<Response> {
    if viewer.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let email = email.trim().to_owned();
    match db::users::find_by_email(&db_pool, &email).await? {
        None => {
            warn!("login for unknown email {email}");
            session::flash(&viewer.session, "User does not exist").await?;
        }
        Some(user) if hasher.verify(&password, &user.password_hash) => {
            sign_in(&viewer.session, &user).await?;
            info!("welcome @{}#{}", user.username, user.id);
            return Ok(Redirect::to(return_to(return_url.as_deref())).into_response());
        }
        Some(user) => {
            warn!("wrong password for @{}", user.username);
            session::flash(&viewer.session, "Invalid email or password").await?;
        }
    }

    login_form(&viewer, return_url, email).await
}

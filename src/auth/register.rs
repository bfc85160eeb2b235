use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    db::{self, is_unique_violation},
    identity::Viewer,
    session,
    templates::{render, LoginRegisterTemplate, Nav},
    AppResult, AppState,
};

use super::{password::Hasher, sign_in};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    name: String,
    username: String,
    email: String,
    password1: String,
    password2: String,
}

/// Letters, digits and `@.+-_`.
pub(crate) fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
}

pub(crate) fn valid_email(email: &str) -> bool {
    matches!(email.split_once('@'), Some((local, domain)) if !local.is_empty() && !domain.is_empty())
}

impl RegisterForm {
    fn is_valid(&self) -> bool {
        valid_username(self.username.trim())
            && valid_email(self.email.trim())
            && self.password1 == self.password2
            && self.password1.chars().count() >= MIN_PASSWORD_LEN
    }
}

async fn register_form(viewer: &Viewer, name: String, username: String, email: String) -> AppResult<Response> {
    render(LoginRegisterTemplate {
        nav: Nav::new(&viewer.session, viewer.user.as_ref()).await?,
        page: "register",
        return_url: String::new(),
        name,
        username,
        email,
    })
}

#[debug_handler(state = AppState)]
pub async fn register_page(viewer: Viewer) -> AppResult<Response> {
    register_form(&viewer, String::new(), String::new(), String::new()).await
}

#[debug_handler(state = AppState)]
pub async fn register(
    viewer: Viewer,
    State(db_pool): State<SqlitePool>,
    State(hasher): State<Hasher>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if form.is_valid() {
        let new_user = db::users::NewUser {
            name: form.name.trim().to_owned(),
            username: form.username.trim().to_lowercase(),
            email: form.email.trim().to_owned(),
            password_hash: hasher.hash(&form.password1)?,
        };

        match db::users::create(&db_pool, new_user).await {
            Ok(user) => {
                sign_in(&viewer.session, &user).await?;
                info!("registered @{}#{}", user.username, user.id);
                return Ok(Redirect::to("/").into_response());
            }
            Err(e) if is_unique_violation(&e) => {
                warn!("registration clashed with an existing account: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    session::flash(&viewer.session, "An error occurred during registration").await?;
    let RegisterForm { name, username, email, .. } = form;
    register_form(&viewer, name, username, email).await
}

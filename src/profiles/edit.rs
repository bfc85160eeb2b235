use axum::{
    debug_handler,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    auth::{valid_email, valid_username},
    db::{self, is_unique_violation, users::ProfileFields, User},
    identity::SignedIn,
    session,
    templates::{avatar_url, render, Nav, UpdateUserTemplate},
    AppResult, AppState,
};

use super::MediaStore;

const UPDATE_FAILED: &str = "Could not update profile";

#[derive(Debug, Default)]
struct ProfileForm {
    name: String,
    username: String,
    email: String,
    bio: String,
    /// Extension and contents of an uploaded avatar.
    avatar: Option<(String, Vec<u8>)>,
    bad_avatar: bool,
    /// The body was cut off, so the fields read so far are incomplete.
    truncated: bool,
}

fn too_large(err: &MultipartError) -> bool {
    err.status() == StatusCode::PAYLOAD_TOO_LARGE
}

impl ProfileForm {
    fn current(user: &User) -> ProfileForm {
        ProfileForm {
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            bio: user.bio.clone().unwrap_or_default(),
            ..Default::default()
        }
    }

    async fn read(mut multipart: Multipart) -> AppResult<ProfileForm> {
        let mut form = ProfileForm::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) if too_large(&e) => {
                    warn!("profile upload rejected: {e}");
                    form.truncated = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "avatar" => {
                    let file_name = field.file_name().unwrap_or_default().to_owned();
                    let data = match field.bytes().await {
                        Ok(data) => data,
                        Err(e) => {
                            warn!("avatar upload failed: {e}");
                            form.bad_avatar = true;
                            form.truncated = true;
                            break;
                        }
                    };
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    match MediaStore::avatar_extension(&file_name) {
                        Some(ext) if !data.is_empty() => form.avatar = Some((ext, data.to_vec())),
                        _ => form.bad_avatar = true,
                    }
                }
                "name" | "username" | "email" | "bio" => {
                    let value = match field.text().await {
                        Ok(value) => value.trim().to_owned(),
                        Err(e) if too_large(&e) => {
                            warn!("profile upload rejected: {e}");
                            form.truncated = true;
                            break;
                        }
                        Err(e) => return Err(e.into()),
                    };
                    match name.as_str() {
                        "name" => form.name = value,
                        "username" => form.username = value.to_lowercase(),
                        "email" => form.email = value,
                        _ => form.bio = value,
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn is_valid(&self) -> bool {
        !self.bad_avatar && !self.truncated && valid_username(&self.username) && valid_email(&self.email)
    }
}

async fn profile_form(member: &SignedIn, form: ProfileForm) -> AppResult<Response> {
    render(UpdateUserTemplate {
        nav: Nav::new(&member.session, Some(&member.user)).await?,
        avatar_url: avatar_url(member.user.avatar.as_deref()),
        name: form.name,
        username: form.username,
        email: form.email,
        bio: form.bio,
    })
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_profile_page(member: SignedIn) -> AppResult<Response> {
    let form = ProfileForm::current(&member.user);
    profile_form(&member, form).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_profile(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    State(media): State<MediaStore>,
    multipart: Multipart,
) -> AppResult<Response> {
    let mut form = ProfileForm::read(multipart).await?;
    if !form.is_valid() {
        session::flash(&member.session, UPDATE_FAILED).await?;
        if form.truncated {
            form = ProfileForm::current(&member.user);
        }
        return profile_form(&member, form).await;
    }

    let avatar = match form.avatar.take() {
        Some((ext, data)) => Some(media.save_avatar(&ext, &data).await?),
        None => None,
    };
    let fields = ProfileFields {
        name: form.name.clone(),
        username: form.username.clone(),
        email: form.email.clone(),
        bio: (!form.bio.is_empty()).then(|| form.bio.clone()),
        avatar,
    };

    match db::users::update_profile(&db_pool, &member.user.id, fields).await {
        Ok(user) => {
            info!("@{} updated their profile", user.username);
            Ok(Redirect::to(&format!("/p/{}", user.id)).into_response())
        }
        Err(e) if is_unique_violation(&e) => {
            warn!("profile update for {} clashed: {e}", member.user.id);
            session::flash(&member.session, UPDATE_FAILED).await?;
            profile_form(&member, form).await
        }
        Err(e) => Err(e.into()),
    }
}

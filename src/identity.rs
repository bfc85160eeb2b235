//! Who is making the request, and what they may change.
//!
//! Handlers never read the session for identity themselves; they take a [`Viewer`]
//! (anyone) or a [`SignedIn`] (members only) and ask [`can_modify`] before editing.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{db::{self, Message, Room, RoomListing, User}, session::USER_ID, AppError, AppState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Member(String),
}

impl Identity {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Member(id) => Some(id),
        }
    }
}

/// Something with a single user allowed to edit or delete it.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for Room {
    fn owner_id(&self) -> &str {
        &self.host_id
    }
}

impl Owned for RoomListing {
    fn owner_id(&self) -> &str {
        &self.host_id
    }
}

impl Owned for Message {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

pub fn can_modify(identity: &Identity, item: &impl Owned) -> bool {
    identity.user_id() == Some(item.owner_id())
}

/// The session and, when signed in, the user behind it.
pub struct Viewer {
    pub session: Session,
    pub user: Option<User>,
}

impl Viewer {
    pub fn identity(&self) -> Identity {
        match &self.user {
            Some(user) => Identity::Member(user.id.clone()),
            None => Identity::Anonymous,
        }
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::from(msg))?;

        let user = match session.get::<String>(USER_ID).await? {
            Some(user_id) => db::users::find(&state.db_pool, &user_id).await?,
            None => None,
        };

        Ok(Viewer { session, user })
    }
}

/// Like [`Viewer`], but anonymous requests are sent to the login page instead.
pub struct SignedIn {
    pub session: Session,
    pub user: User,
}

impl SignedIn {
    pub fn identity(&self) -> Identity {
        Identity::Member(self.user.id.clone())
    }
}

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Viewer { session, user } = Viewer::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match user {
            Some(user) => Ok(SignedIn { session, user }),
            None => {
                let path = match OriginalUri::from_request_parts(parts, state).await {
                    Ok(OriginalUri(uri)) => uri.path().to_owned(),
                    Err(never) => match never {},
                };
                Err(Redirect::to(&format!("/login?return_url={path}")).into_response())
            }
        }
    }
}

mod delete;
mod edit;
mod msg;
mod new;
mod room;

use axum::{http::StatusCode, response::{IntoResponse, Response}, routing::get, Router};
use serde::Deserialize;

use crate::{db::rooms::RoomFields, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new", get(new::new_room_page).post(new::new_room))
        .route("/{id}", get(room::room).post(room::post_message))
        .route("/{id}/edit", get(edit::edit_room_page).post(edit::edit_room))
        .route("/{id}/delete", get(delete::delete_room_page).post(delete::delete_room))
}

pub fn message_router() -> Router<AppState> {
    Router::new()
        .route("/m/{id}/delete", get(msg::delete_message_page).post(msg::delete_message))
}

/// Plain-text refusal for someone touching what they don't own.
pub(crate) fn denied(reason: &'static str) -> Response {
    (StatusCode::FORBIDDEN, reason).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RoomForm {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

impl RoomForm {
    /// `None` when the topic or name is blank.
    pub(crate) fn fields(&self) -> Option<RoomFields> {
        let topic = self.topic.trim();
        let name = self.name.trim();
        if topic.is_empty() || name.is_empty() {
            return None;
        }

        let description = self.description.trim();
        Some(RoomFields {
            topic: topic.to_owned(),
            name: name.to_owned(),
            description: (!description.is_empty()).then(|| description.to_owned()),
        })
    }
}

use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    db,
    identity::{can_modify, SignedIn, Viewer},
    session,
    templates::{render, MessageView, Nav, RoomTemplate, RoomView, UserView},
    AppResult, AppState,
};

#[derive(Deserialize)]
pub(crate) struct PostMessageForm {
    #[serde(default)]
    body: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn room(
    viewer: Viewer,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let room_id = room_id.to_string();

    let room = db::rooms::get(&db_pool, &room_id).await?;
    let listing = db::rooms::get_listing(&db_pool, &room_id).await?;
    let messages = db::messages::in_room(&db_pool, &room_id).await?;
    let participants = db::rooms::participants(&db_pool, &room_id).await?;

    let identity = viewer.identity();
    render(RoomTemplate {
        nav: Nav::new(&viewer.session, viewer.user.as_ref()).await?,
        can_edit: can_modify(&identity, &room),
        room: RoomView::from(listing),
        messages: MessageView::list(messages, &identity),
        participants: participants.iter().map(UserView::from).collect(),
    })
}

#[debug_handler(state = AppState)]
pub(crate) async fn post_message(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    Form(PostMessageForm { body }): Form<PostMessageForm>,
) -> AppResult<Response> {
    let room = db::rooms::get(&db_pool, &room_id.to_string()).await?;

    let body = body.trim();
    if body.is_empty() {
        session::flash(&member.session, "Message cannot be empty").await?;
    } else {
        let message = db::messages::post(&db_pool, &room.id, &member.user.id, body).await?;
        info!("@{} posted {} in {}", member.user.username, message.id, room.id);
    }

    Ok(Redirect::to(&format!("/r/{}", room.id)).into_response())
}

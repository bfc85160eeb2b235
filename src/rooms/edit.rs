use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}, Form};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db,
    identity::{can_modify, SignedIn},
    session,
    templates::{render, Nav, RoomFormTemplate},
    AppResult, AppState,
};

use super::{denied, RoomForm};

const NOT_HOST: &str = "You are not allowed to edit this room";

async fn room_form(member: &SignedIn, db_pool: &SqlitePool, room_id: &str, form: RoomForm) -> AppResult<Response> {
    render(RoomFormTemplate {
        nav: Nav::new(&member.session, Some(&member.user)).await?,
        action: format!("/r/{room_id}/edit"),
        topic: form.topic,
        name: form.name,
        description: form.description,
        topics: db::topics::matching(db_pool, "", None).await?,
    })
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_room_page(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let listing = db::rooms::get_listing(&db_pool, &room_id.to_string()).await?;
    if !can_modify(&member.identity(), &listing) {
        warn!("@{} may not edit room {}", member.user.username, listing.id);
        return Ok(denied(NOT_HOST));
    }

    let form = RoomForm {
        topic: listing.topic_name,
        name: listing.name,
        description: listing.description.unwrap_or_default(),
    };
    room_form(&member, &db_pool, &listing.id, form).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_room(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let room = db::rooms::get(&db_pool, &room_id.to_string()).await?;
    if !can_modify(&member.identity(), &room) {
        warn!("@{} may not edit room {}", member.user.username, room.id);
        return Ok(denied(NOT_HOST));
    }

    let Some(fields) = form.fields() else {
        session::flash(&member.session, "A room needs a topic and a name").await?;
        return room_form(&member, &db_pool, &room.id, form).await;
    };

    db::rooms::update(&db_pool, &room.id, fields).await?;
    info!("@{} updated room {}", member.user.username, room.id);

    Ok(Redirect::to("/").into_response())
}

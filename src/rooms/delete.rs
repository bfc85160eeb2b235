use axum::{debug_handler, extract::{Path, State}, response::{IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db,
    identity::{can_modify, SignedIn},
    templates::{render, DeleteTemplate, Nav},
    AppResult, AppState,
};

use super::denied;

const NOT_HOST: &str = "You are not allowed to delete this room";

#[debug_handler(state = AppState)]
pub(crate) async fn delete_room_page(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let room = db::rooms::get(&db_pool, &room_id.to_string()).await?;
    if !can_modify(&member.identity(), &room) {
        warn!("@{} may not delete room {}", member.user.username, room.id);
        return Ok(denied(NOT_HOST));
    }

    render(DeleteTemplate {
        nav: Nav::new(&member.session, Some(&member.user)).await?,
        cancel_url: format!("/r/{}", room.id),
        obj: room.name,
    })
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_room(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<Uuid>,
) -> AppResult<Response> {
    let room = db::rooms::get(&db_pool, &room_id.to_string()).await?;
    if !can_modify(&member.identity(), &room) {
        warn!("@{} may not delete room {}", member.user.username, room.id);
        return Ok(denied(NOT_HOST));
    }

    db::rooms::delete(&db_pool, &room.id).await?;
    info!("@{} deleted room {}", member.user.username, room.id);

    Ok(Redirect::to("/").into_response())
}

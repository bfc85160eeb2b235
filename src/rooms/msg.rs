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

const NOT_AUTHOR: &str = "You are not allowed to delete this message";

/// How a message is named on its delete confirmation.
fn excerpt(body: &str) -> String {
    const MAX: usize = 50;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_message_page(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Response> {
    let message = db::messages::get(&db_pool, &message_id.to_string()).await?;
    if !can_modify(&member.identity(), &message) {
        warn!("@{} may not delete message {}", member.user.username, message.id);
        return Ok(denied(NOT_AUTHOR));
    }

    render(DeleteTemplate {
        nav: Nav::new(&member.session, Some(&member.user)).await?,
        obj: excerpt(&message.body),
        cancel_url: format!("/r/{}", message.room_id),
    })
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_message(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Response> {
    let message = db::messages::get(&db_pool, &message_id.to_string()).await?;
    if !can_modify(&member.identity(), &message) {
        warn!("@{} may not delete message {}", member.user.username, message.id);
        return Ok(denied(NOT_AUTHOR));
    }

    db::messages::delete(&db_pool, &message.id).await?;
    info!("@{} deleted message {}", member.user.username, message.id);

    Ok(Redirect::to("/").into_response())
}

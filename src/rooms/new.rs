use axum::{debug_handler, extract::State, response::{IntoResponse, Redirect, Response}, Form};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    db,
    identity::SignedIn,
    session,
    templates::{render, Nav, RoomFormTemplate},
    AppResult, AppState,
};

use super::RoomForm;

async fn room_form(member: &SignedIn, db_pool: &SqlitePool, form: RoomForm) -> AppResult<Response> {
    render(RoomFormTemplate {
        nav: Nav::new(&member.session, Some(&member.user)).await?,
        action: "/r/new".to_owned(),
        topic: form.topic,
        name: form.name,
        description: form.description,
        topics: db::topics::matching(db_pool, "", None).await?,
    })
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_room_page(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    room_form(&member, &db_pool, RoomForm::default()).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn new_room(
    member: SignedIn,
    State(db_pool): State<SqlitePool>,
    Form(form): Form<RoomForm>,
) -> AppResult<Response> {
    let Some(fields) = form.fields() else {
        session::flash(&member.session, "A room needs a topic and a name").await?;
        return room_form(&member, &db_pool, form).await;
    };

    let room = db::rooms::create(&db_pool, &member.user.id, fields).await?;
    info!("@{} created room {} ({})", member.user.username, room.name, room.id);

    Ok(Redirect::to("/").into_response())
}

use axum::{debug_handler, extract::{Path, State}, response::Response};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    db,
    identity::Viewer,
    templates::{render, MessageView, Nav, ProfileTemplate, RoomView, UserView},
    AppResult, AppState,
};

const PROFILE_ACTIVITY: i64 = 10;

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    viewer: Viewer,
    State(db_pool): State<SqlitePool>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Response> {
    let user = db::users::get(&db_pool, &user_id.to_string()).await?;
    let rooms = db::rooms::hosted_by(&db_pool, &user.id).await?;
    let activity = db::messages::by_user(&db_pool, &user.id, PROFILE_ACTIVITY).await?;

    let identity = viewer.identity();
    render(ProfileTemplate {
        nav: Nav::new(&viewer.session, viewer.user.as_ref()).await?,
        is_self: identity.user_id() == Some(user.id.as_str()),
        user: UserView::from(&user),
        rooms: rooms.into_iter().map(RoomView::from).collect(),
        activity: MessageView::list(activity, &identity),
        topics: db::topics::matching(&db_pool, "", None).await?,
        total_rooms: db::rooms::count_all(&db_pool).await?,
    })
}

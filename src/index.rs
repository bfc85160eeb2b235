use axum::{debug_handler, extract::{Query, State}, response::Response};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    db,
    identity::Viewer,
    templates::{render, ActivityTemplate, HomeTemplate, MessageView, Nav, RoomView, TopicsTemplate},
    AppResult, AppState,
};

const HOME_TOPICS: i64 = 5;
const HOME_ACTIVITY: i64 = 10;

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

#[debug_handler(state = AppState)]
pub async fn home(
    viewer: Viewer,
    State(db_pool): State<SqlitePool>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Response> {
    let q = q.unwrap_or_default();

    let rooms: Vec<RoomView> = db::rooms::search(&db_pool, &q).await?
        .into_iter()
        .map(RoomView::from)
        .collect();
    let topics = db::topics::matching(&db_pool, "", Some(HOME_TOPICS)).await?;
    let total_rooms = db::rooms::count_all(&db_pool).await?;
    let activity = db::messages::recent_by_topic(&db_pool, &q, HOME_ACTIVITY).await?;

    render(HomeTemplate {
        nav: Nav::new(&viewer.session, viewer.user.as_ref()).await?,
        room_count: rooms.len(),
        rooms,
        topics,
        total_rooms,
        activity: MessageView::list(activity, &viewer.identity()),
        q,
    })
}

#[debug_handler(state = AppState)]
pub async fn topics(
    viewer: Viewer,
    State(db_pool): State<SqlitePool>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> AppResult<Response> {
    let q = q.unwrap_or_default();

    render(TopicsTemplate {
        nav: Nav::new(&viewer.session, viewer.user.as_ref()).await?,
        topics: db::topics::matching(&db_pool, &q, None).await?,
        total_rooms: db::rooms::count_all(&db_pool).await?,
        q,
    })
}

#[debug_handler(state = AppState)]
pub async fn activity(
    viewer: Viewer,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Response> {
    let activity = db::messages::all(&db_pool).await?;

    render(ActivityTemplate {
        nav: Nav::new(&viewer.session, viewer.user.as_ref()).await?,
        activity: MessageView::list(activity, &viewer.identity()),
    })
}

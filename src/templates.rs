//! Askama templates for the forum pages

use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use time::{macros::format_description, OffsetDateTime};
use tower_sessions::Session;

use crate::{
    db::{MessageListing, RoomListing, TopicSummary, User},
    identity::Identity,
    res, session, AppResult,
};

pub fn render(template: impl Template) -> AppResult<Response> {
    Ok(Html(template.render()?).into_response())
}

pub fn avatar_url(avatar: Option<&str>) -> String {
    match avatar {
        Some(path) => format!("/media/{path}"),
        None => "/static/avatar.svg".to_owned(),
    }
}

/// Coarse age of a timestamp, e.g. `3 hours ago`.
pub fn since(then: OffsetDateTime) -> String {
    const UNITS: [(i64, &str); 6] = [
        (365 * 86_400, "year"),
        (30 * 86_400, "month"),
        (7 * 86_400, "week"),
        (86_400, "day"),
        (3_600, "hour"),
        (60, "minute"),
    ];

    let seconds = (OffsetDateTime::now_utc() - then).whole_seconds().max(0);
    for (size, unit) in UNITS {
        let n = seconds / size;
        if n > 0 {
            return format!("{n} {unit}{} ago", if n == 1 { "" } else { "s" });
        }
    }
    "just now".to_owned()
}

fn stamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
        .unwrap_or_default()
}

/// Header state shared by every page.
pub struct Nav {
    pub user: Option<NavUser>,
    pub flashes: Vec<String>,
}

pub struct NavUser {
    pub id: String,
    pub username: String,
    pub avatar_url: String,
}

impl Nav {
    /// Takes the pending flash messages out of the session.
    pub async fn new(session: &Session, user: Option<&User>) -> AppResult<Nav> {
        Ok(Nav {
            user: user.map(|user| NavUser {
                id: user.id.clone(),
                username: user.username.clone(),
                avatar_url: avatar_url(user.avatar.as_deref()),
            }),
            flashes: session::take_flashes(session).await?,
        })
    }
}

pub struct RoomView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub host_id: String,
    pub host_username: String,
    pub host_avatar_url: String,
    pub topic_name: String,
    pub participant_count: i64,
    pub since: String,
}

impl From<RoomListing> for RoomView {
    fn from(room: RoomListing) -> Self {
        RoomView {
            host_avatar_url: avatar_url(room.host_avatar.as_deref()),
            since: since(room.created),
            id: room.id,
            name: room.name,
            description: room.description.unwrap_or_default(),
            host_id: room.host_id,
            host_username: room.host_username,
            topic_name: room.topic_name,
            participant_count: room.participant_count,
        }
    }
}

pub struct MessageView {
    pub id: String,
    pub body_html: String,
    pub user_id: String,
    pub username: String,
    pub avatar_url: String,
    pub room_id: String,
    pub room_name: String,
    pub since: String,
    pub stamp: String,
    pub can_delete: bool,
}

impl MessageView {
    pub fn new(message: MessageListing, viewer: &Identity) -> Self {
        MessageView {
            body_html: res::markdown(&message.body),
            avatar_url: avatar_url(message.avatar.as_deref()),
            since: since(message.created),
            stamp: stamp(message.created),
            can_delete: viewer.user_id() == Some(message.user_id.as_str()),
            id: message.id,
            user_id: message.user_id,
            username: message.username,
            room_id: message.room_id,
            room_name: message.room_name,
        }
    }

    pub fn list(messages: Vec<MessageListing>, viewer: &Identity) -> Vec<MessageView> {
        messages.into_iter().map(|m| MessageView::new(m, viewer)).collect()
    }
}

pub struct UserView {
    pub id: String,
    pub name: String,
    pub username: String,
    pub bio: String,
    pub avatar_url: String,
    pub joined: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            bio: user.bio.clone().unwrap_or_default(),
            avatar_url: avatar_url(user.avatar.as_deref()),
            joined: stamp(user.created),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub q: String,
    pub rooms: Vec<RoomView>,
    pub room_count: usize,
    pub topics: Vec<TopicSummary>,
    pub total_rooms: i64,
    pub activity: Vec<MessageView>,
}

#[derive(Template)]
#[template(path = "topics.html")]
pub struct TopicsTemplate {
    pub nav: Nav,
    pub q: String,
    pub topics: Vec<TopicSummary>,
    pub total_rooms: i64,
}

#[derive(Template)]
#[template(path = "activity.html")]
pub struct ActivityTemplate {
    pub nav: Nav,
    pub activity: Vec<MessageView>,
}

#[derive(Template)]
#[template(path = "room.html")]
pub struct RoomTemplate {
    pub nav: Nav,
    pub room: RoomView,
    pub messages: Vec<MessageView>,
    pub participants: Vec<UserView>,
    pub can_edit: bool,
}

/// Shared by room creation and room editing.
#[derive(Template)]
#[template(path = "room_form.html")]
pub struct RoomFormTemplate {
    pub nav: Nav,
    pub action: String,
    pub topic: String,
    pub name: String,
    pub description: String,
    pub topics: Vec<TopicSummary>,
}

#[derive(Template)]
#[template(path = "delete.html")]
pub struct DeleteTemplate {
    pub nav: Nav,
    pub obj: String,
    pub cancel_url: String,
}

/// `page` is either `login` or `register`.
#[derive(Template)]
#[template(path = "login_register.html")]
pub struct LoginRegisterTemplate {
    pub nav: Nav,
    pub page: &'static str,
    pub return_url: String,
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub user: UserView,
    pub is_self: bool,
    pub rooms: Vec<RoomView>,
    pub activity: Vec<MessageView>,
    pub topics: Vec<TopicSummary>,
    pub total_rooms: i64,
}

#[derive(Template)]
#[template(path = "update_user.html")]
pub struct UpdateUserTemplate {
    pub nav: Nav,
    pub name: String,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub avatar_url: String,
}

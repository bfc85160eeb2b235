use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use roomforum::{app, auth::password::Hasher, db, profiles::MediaStore, AppState};
use sqlx::SqlitePool;
use tower::ServiceExt;

/// Drives the router like a browser would, keeping the session cookie between requests.
#[derive(Clone)]
struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    async fn send(&mut self, mut req: Request<Body>) -> Response {
        if let Some(cookie) = &self.cookie {
            req.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
        }

        let res = self.app.clone().oneshot(req).await.unwrap();

        if let Some(set_cookie) = res.headers().get(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            self.cookie = if set_cookie.contains("Max-Age=0") {
                None
            } else {
                set_cookie.split(';').next().map(str::to_owned)
            };
        }

        res
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form(fields)))
            .unwrap();
        self.send(req).await
    }

    /// A second browser against the same server.
    fn stranger(&self) -> Client {
        Client { app: self.app.clone(), cookie: None }
    }
}

fn form(fields: &[(&str, &str)]) -> String {
    fn encode(s: &str) -> String {
        s.bytes()
            .map(|b| match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => (b as char).to_string(),
                b' ' => "+".to_owned(),
                _ => format!("%{b:02X}"),
            })
            .collect()
    }

    fields
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

async fn text(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(res: &Response) -> &str {
    res.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

async fn setup() -> (Client, SqlitePool) {
    let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
    let media_dir = std::env::temp_dir().join(format!("roomforum-test-{}", uuid::Uuid::now_v7().simple()));
    let state = AppState {
        db_pool: db_pool.clone(),
        hasher: Hasher::with_cost(1024, 1).unwrap(),
        media: MediaStore::new(media_dir),
    };

    let client = Client { app: app(state, time::Duration::minutes(5)), cookie: None };
    (client, db_pool)
}

async fn register(client: &mut Client, db_pool: &SqlitePool, username: &str) -> db::User {
    let email = format!("{}@example.com", username.to_lowercase());
    let res = client
        .post("/register", &[
            ("name", username),
            ("username", username),
            ("email", &email),
            ("password1", "hunter2hunter2"),
            ("password2", "hunter2hunter2"),
        ])
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");

    db::users::find_by_email(db_pool, &email).await.unwrap().unwrap()
}

async fn create_room(client: &mut Client, db_pool: &SqlitePool, topic: &str, name: &str) -> db::RoomListing {
    let res = client
        .post("/r/new", &[("topic", topic), ("name", name), ("description", "")])
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    db::rooms::search(db_pool, name)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == name)
        .unwrap()
}

#[tokio::test]
async fn registration_lowercases_the_username() {
    let (mut client, db_pool) = setup().await;

    let user = register(&mut client, &db_pool, "MixedCase").await;

    assert_eq!(user.username, "mixedcase");
    assert_ne!(user.password_hash, "hunter2hunter2");
    assert_eq!(client.get("/r/new").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_registration_keeps_input_and_shows_error() {
    let (mut client, db_pool) = setup().await;

    let res = client
        .post("/register", &[
            ("name", "Ann"),
            ("username", "ann"),
            ("email", "ann@example.com"),
            ("password1", "hunter2hunter2"),
            ("password2", "something-else"),
        ])
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = text(res).await;
    assert!(body.contains("An error occurred during registration"));
    assert!(body.contains("ann@example.com"));
    assert!(db::users::find_by_email(&db_pool, "ann@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected_case_insensitively() {
    let (mut client, db_pool) = setup().await;
    register(&mut client, &db_pool, "ann").await;

    let mut other = client.stranger();
    let res = other
        .post("/register", &[
            ("username", "ANN"),
            ("email", "someone@example.com"),
            ("password1", "hunter2hunter2"),
            ("password2", "hunter2hunter2"),
        ])
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(text(res).await.contains("An error occurred during registration"));
}

#[tokio::test]
async fn login_reports_unknown_users_and_bad_passwords() {
    let (mut client, db_pool) = setup().await;
    register(&mut client, &db_pool, "ann").await;
    let mut browser = client.stranger();

    let res = browser.post("/login", &[("email", "nobody@example.com"), ("password", "x")]).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(text(res).await.contains("User does not exist"));

    let res = browser.post("/login", &[("email", "ann@example.com"), ("password", "wrong-password")]).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(text(res).await.contains("Invalid email or password"));

    let res = browser
        .post("/login", &[("email", "ann@example.com"), ("password", "hunter2hunter2"), ("return_url", "/r/new")])
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/r/new");

    let res = browser.get("/login").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
}

#[tokio::test]
async fn after_logout_creating_a_room_needs_login() {
    let (mut client, db_pool) = setup().await;
    register(&mut client, &db_pool, "ann").await;
    assert_eq!(client.get("/r/new").await.status(), StatusCode::OK);

    let res = client.get("/logout").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = client.get("/r/new").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login?return_url=/r/new");

    let res = client.post("/r/new", &[("topic", "Rust"), ("name", "sneaky")]).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(location(&res).starts_with("/login"));
    assert_eq!(db::rooms::count_all(&db_pool).await.unwrap(), 0);
}

#[tokio::test]
async fn rooms_reuse_topics_with_the_exact_same_name() {
    let (mut client, db_pool) = setup().await;
    register(&mut client, &db_pool, "ann").await;

    let first = create_room(&mut client, &db_pool, "Rust", "borrowck").await;
    let second = create_room(&mut client, &db_pool, "Rust", "lifetimes").await;
    create_room(&mut client, &db_pool, "rust", "lowercase").await;

    assert_eq!(first.topic_name, second.topic_name);
    let topics = db::topics::matching(&db_pool, "", None).await.unwrap();
    let names: Vec<_> = topics.iter().map(|t| (t.name.as_str(), t.room_count)).collect();
    assert_eq!(names, [("Rust", 2), ("rust", 1)]);
}

#[tokio::test]
async fn room_form_requires_topic_and_name() {
    let (mut client, db_pool) = setup().await;
    register(&mut client, &db_pool, "ann").await;

    let res = client.post("/r/new", &[("topic", "Rust"), ("name", "  ")]).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(text(res).await.contains("A room needs a topic and a name"));
    assert_eq!(db::rooms::count_all(&db_pool).await.unwrap(), 0);
}

#[tokio::test]
async fn home_search_filters_rooms() {
    let (mut client, db_pool) = setup().await;
    register(&mut client, &db_pool, "ann").await;
    create_room(&mut client, &db_pool, "Rust", "borrowck").await;
    create_room(&mut client, &db_pool, "Python", "asyncio").await;

    let body = text(client.get("/").await).await;
    assert!(body.contains("2 rooms available"));
    assert!(body.contains("borrowck") && body.contains("asyncio"));

    let body = text(client.get("/?q=python").await).await;
    assert!(body.contains("1 rooms available"));
    assert!(body.contains("asyncio"));
    assert!(!body.contains("borrowck"));

    let body = text(client.get("/?q=cobol").await).await;
    assert!(body.contains("0 rooms available"));
}

#[tokio::test]
async fn posting_adds_the_author_to_participants_once() {
    let (mut host, db_pool) = setup().await;
    register(&mut host, &db_pool, "ann").await;
    let room = create_room(&mut host, &db_pool, "Rust", "borrowck").await;

    let mut guest = host.stranger();
    let bob = register(&mut guest, &db_pool, "bob").await;
    let room_url = format!("/r/{}", room.id);

    for _ in 0..2 {
        let res = guest.post(&room_url, &[("body", "hello *there*")]).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), room_url);
    }

    let participants = db::rooms::participants(&db_pool, &room.id).await.unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].id, bob.id);
    assert_eq!(db::messages::in_room(&db_pool, &room.id).await.unwrap().len(), 2);

    let body = text(guest.get(&room_url).await).await;
    assert!(body.contains("hello <em>there</em>"));
    assert!(body.contains("Participants (1 joined)"));
}

#[tokio::test]
async fn anonymous_posts_are_sent_to_login() {
    let (mut host, db_pool) = setup().await;
    register(&mut host, &db_pool, "ann").await;
    let room = create_room(&mut host, &db_pool, "Rust", "borrowck").await;

    let mut anonymous = host.stranger();
    let room_url = format!("/r/{}", room.id);
    assert_eq!(anonymous.get(&room_url).await.status(), StatusCode::OK);

    let res = anonymous.post(&room_url, &[("body", "hi")]).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/login?return_url={room_url}"));
    assert!(db::messages::in_room(&db_pool, &room.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn only_the_host_may_edit_or_delete_a_room() {
    let (mut host, db_pool) = setup().await;
    register(&mut host, &db_pool, "ann").await;
    let room = create_room(&mut host, &db_pool, "Rust", "borrowck").await;
    let mut other = host.stranger();
    register(&mut other, &db_pool, "bob").await;

    let edit_url = format!("/r/{}/edit", room.id);
    let delete_url = format!("/r/{}/delete", room.id);

    let res = other.get(&edit_url).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(text(res).await, "You are not allowed to edit this room");

    let res = other.post(&edit_url, &[("topic", "Go"), ("name", "hijacked")]).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = other.post(&delete_url, &[]).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(text(res).await, "You are not allowed to delete this room");
    assert_eq!(db::rooms::get(&db_pool, &room.id).await.unwrap().name, "borrowck");

    let res = host.get(&edit_url).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = text(res).await;
    assert!(page.contains(r#"value="borrowck""#) && page.contains(r#"value="Rust""#));
    let res = host
        .post(&edit_url, &[("topic", "Go"), ("name", "goroutines"), ("description", "channels")])
        .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let edited = db::rooms::get_listing(&db_pool, &room.id).await.unwrap();
    assert_eq!(edited.name, "goroutines");
    assert_eq!(edited.topic_name, "Go");
    assert_eq!(edited.description.as_deref(), Some("channels"));
    assert_eq!(edited.host_id, room.host_id);

    assert_eq!(host.get(&delete_url).await.status(), StatusCode::OK);
    let res = host.post(&delete_url, &[]).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(db::rooms::count_all(&db_pool).await.unwrap(), 0);
}

#[tokio::test]
async fn only_the_author_may_delete_a_message() {
    let (mut author, db_pool) = setup().await;
    register(&mut author, &db_pool, "ann").await;
    let room = create_room(&mut author, &db_pool, "Rust", "borrowck").await;
    author.post(&format!("/r/{}", room.id), &[("body", "mine")]).await;
    let message = db::messages::in_room(&db_pool, &room.id).await.unwrap().remove(0);

    let mut other = author.stranger();
    register(&mut other, &db_pool, "bob").await;
    let delete_url = format!("/m/{}/delete", message.id);

    let res = other.get(&delete_url).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = other.post(&delete_url, &[]).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(text(res).await, "You are not allowed to delete this message");

    assert_eq!(author.get(&delete_url).await.status(), StatusCode::OK);
    let res = author.post(&delete_url, &[]).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert!(db::messages::in_room(&db_pool, &room.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_room_drops_its_messages_from_listings() {
    let (mut client, db_pool) = setup().await;
    register(&mut client, &db_pool, "ann").await;
    let doomed = create_room(&mut client, &db_pool, "Rust", "doomed").await;
    let kept = create_room(&mut client, &db_pool, "Rust", "kept").await;
    client.post(&format!("/r/{}", doomed.id), &[("body", "vanishing-words")]).await;
    client.post(&format!("/r/{}", kept.id), &[("body", "staying-words")]).await;

    assert!(text(client.get("/activity").await).await.contains("vanishing-words"));

    client.post(&format!("/r/{}/delete", doomed.id), &[]).await;

    let activity = text(client.get("/activity").await).await;
    assert!(!activity.contains("vanishing-words"));
    assert!(activity.contains("staying-words"));
    let home = text(client.get("/").await).await;
    assert!(!home.contains("vanishing-words"));
}

#[tokio::test]
async fn missing_rooms_fail_hard() {
    let (mut client, _db_pool) = setup().await;

    let res = client.get(&format!("/r/{}", uuid::Uuid::now_v7())).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = client.get("/r/not-a-uuid").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn topics_and_profile_pages_render() {
    let (mut client, db_pool) = setup().await;
    let ann = register(&mut client, &db_pool, "ann").await;
    create_room(&mut client, &db_pool, "Rust", "borrowck").await;
    create_room(&mut client, &db_pool, "Python", "asyncio").await;

    let body = text(client.get("/topics?q=py").await).await;
    assert!(body.contains("Python"));
    assert!(!body.contains(">Rust"));

    let res = client.get(&format!("/p/{}", ann.id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = text(res).await;
    assert!(body.contains("@ann"));
    assert!(body.contains("borrowck") && body.contains("asyncio"));
}

/// A `/p/edit` multipart request with text `fields` followed by an avatar file.
fn profile_upload(fields: &[(&str, &str)], file_name: &str, data: &[u8]) -> Request<Body> {
    let boundary = "roomforumboundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/p/edit")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn profile_update_stores_fields_and_avatar() {
    let (mut client, db_pool) = setup().await;
    let ann = register(&mut client, &db_pool, "ann").await;

    let req = profile_upload(
        &[("name", "Ann Example"), ("username", "AnnE"), ("email", "ann@example.com"), ("bio", "Rustacean")],
        "me.png",
        b"fake png bytes",
    );
    let res = client.send(req).await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), format!("/p/{}", ann.id));

    let updated = db::users::get(&db_pool, &ann.id).await.unwrap();
    assert_eq!(updated.name, "Ann Example");
    assert_eq!(updated.username, "anne");
    assert_eq!(updated.bio.as_deref(), Some("Rustacean"));
    let avatar = updated.avatar.unwrap();
    assert!(avatar.starts_with("avatars/") && avatar.ends_with(".png"));

    let res = client.get(&format!("/media/{avatar}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(text(res).await, "fake png bytes");
}

#[tokio::test]
async fn svg_avatars_are_refused() {
    let (mut client, db_pool) = setup().await;
    let ann = register(&mut client, &db_pool, "ann").await;

    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
    let req = profile_upload(&[("name", "Ann"), ("username", "ann"), ("email", "ann@example.com")], "me.svg", svg);
    let res = client.send(req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(text(res).await.contains("Could not update profile"));
    assert!(db::users::get(&db_pool, &ann.id).await.unwrap().avatar.is_none());
}

#[tokio::test]
async fn oversized_avatars_redisplay_the_form() {
    let (mut client, db_pool) = setup().await;
    let ann = register(&mut client, &db_pool, "ann").await;

    let photo = vec![0u8; roomforum::profiles::MAX_UPLOAD + 1024];
    let req = profile_upload(&[("name", "Renamed"), ("username", "ann"), ("email", "ann@example.com")], "photo.png", &photo);
    let res = client.send(req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = text(res).await;
    assert!(body.contains("Could not update profile"));
    assert!(body.contains("ann@example.com"));

    let unchanged = db::users::get(&db_pool, &ann.id).await.unwrap();
    assert_eq!(unchanged.name, ann.name);
    assert!(unchanged.avatar.is_none());
}

#[tokio::test]
async fn profile_edit_needs_login() {
    let (mut client, _db_pool) = setup().await;

    let res = client.get("/p/edit").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login?return_url=/p/edit");
}

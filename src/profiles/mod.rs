mod edit;
mod media;
mod page;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::AppState;

pub use media::MediaStore;

/// Largest profile form body accepted, avatar included.
pub const MAX_UPLOAD: usize = 4 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/edit",
            get(edit::edit_profile_page)
                .post(edit::edit_profile)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD)),
        )
        .route("/{id}", get(page::profile))
}

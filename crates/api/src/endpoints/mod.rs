//! Page endpoints.

mod comments;
mod feeds;
mod follows;
mod posts;

use axum::{
    Router,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
};

use crate::middleware::AppState;
use crate::response::PageContext;

/// Create the site router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feeds::index))
        .route("/group/{slug}/", get(feeds::group_list))
        .route("/profile/{username}/", get(feeds::profile))
        .route("/follow/", get(feeds::follow_index))
        .route("/profile/{username}/follow/", get(follows::profile_follow))
        .route("/profile/{username}/unfollow/", get(follows::profile_unfollow))
        .route("/create/", get(posts::create_form).post(posts::create))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::edit_form).post(posts::edit),
        )
        .route("/posts/{post_id}/delete/", post(posts::delete))
        .route(
            "/posts/{post_id}/comment/",
            get(comments::add_comment_form).post(comments::add_comment),
        )
        .fallback(not_found)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    PageContext::NotFound {
        path: uri.path().to_string(),
    }
    .with_status(StatusCode::NOT_FOUND)
}

//! Comment submission.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use yatube_common::AppResult;
use yatube_core::{CommentForm, Submission};

use crate::{extractors::AuthUser, middleware::AppState, urls};

/// Comments are only accepted by POST; a GET goes back to the post.
pub async fn add_comment_form(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Redirect> {
    let post = state.post_service.get(&post_id).await?;
    Ok(Redirect::to(&urls::post_detail(&post.id)))
}

/// Add a comment and return to the post. Blank comments are dropped.
pub async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    if let Submission::Rejected(errors) = state.comment_service.add(&user, &post_id, form).await? {
        tracing::debug!(post_id = %post_id, ?errors, "Rejected comment");
    }
    Ok(Redirect::to(&urls::post_detail(&post_id)))
}

//! Follow and unfollow.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use yatube_common::AppResult;

use crate::{extractors::AuthUser, middleware::AppState, urls};

/// Follow an author, then return to their profile.
pub async fn profile_follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let outcome = state.follow_service.follow(&user, &username).await?;
    tracing::debug!(user_id = %user.id, author = %username, ?outcome, "Follow request");
    Ok(Redirect::to(&urls::profile(&username)))
}

/// Unfollow an author, then return to their profile.
pub async fn profile_unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    state.follow_service.unfollow(&user, &username).await?;
    Ok(Redirect::to(&urls::profile(&username)))
}

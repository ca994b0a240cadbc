//! Request extractors.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use yatube_core::PageNumber;
use yatube_db::entities::user;

use crate::{middleware::AppState, urls};

/// Authenticated user extractor.
///
/// Anonymous requests are redirected to the login page, which sends the
/// user back to the requested path afterwards.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

/// Rejection for [`AuthUser`]: a redirect to the login page.
#[derive(Debug)]
pub struct LoginRedirect(String);

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.0).into_response()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by auth middleware)
        if let Some(user) = parts.extensions.get::<user::Model>() {
            return Ok(Self(user.clone()));
        }

        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        Err(LoginRedirect(urls::login(&state.auth.login_url, next)))
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<String>,
}

/// The `page` query parameter, defaulting to the first page.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery(pub PageNumber);

impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = Query::<PageParams>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Query(params)| params.page);
        Ok(Self(PageNumber::parse(raw.as_deref())))
    }
}

//! Application state and middleware.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::{self as axum_middleware, Next},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use yatube_common::config::AuthConfig;
use yatube_core::{CommentService, FeedCache, FollowService, PostService, UserService};

use crate::response::PageContext;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Session token lookup.
    pub user_service: UserService,
    /// Feeds and post pages.
    pub post_service: PostService,
    /// Comment submission.
    pub comment_service: CommentService,
    /// Follow and unfollow.
    pub follow_service: FollowService,
    /// Rendered index pages.
    pub feed_cache: FeedCache,
    /// Login redirect and session cookie settings.
    pub auth: AuthConfig,
}

/// Build the full application: routes, session auth and the not-found page.
pub fn app(state: AppState) -> Router {
    crate::router()
        .layer(axum_middleware::from_fn(not_found_page))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Authentication middleware.
///
/// Resolves the current user from a bearer token or the session cookie and
/// stores it in the request extensions. Unknown tokens leave the request
/// anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(&req, &state.auth.session_cookie) {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid session token"),
        }
    }

    next.run(req).await
}

fn session_token(req: &Request<Body>, cookie_name: &str) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(req.headers())
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Replace every 404 with the not-found page for the requested path.
pub async fn not_found_page(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    if response.status() == StatusCode::NOT_FOUND {
        tracing::debug!(path = %path, "Page not found");
        return PageContext::NotFound { path }
            .with_status(StatusCode::NOT_FOUND)
            .into_response();
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token() {
        let req = request(&[("authorization", "Bearer abc")]);
        assert_eq!(session_token(&req, "sessionid").as_deref(), Some("abc"));
    }

    #[test]
    fn test_session_cookie() {
        let req = request(&[("cookie", "theme=dark; sessionid=xyz")]);
        assert_eq!(session_token(&req, "sessionid").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let req = request(&[("authorization", "Bearer abc"), ("cookie", "sessionid=xyz")]);
        assert_eq!(session_token(&req, "sessionid").as_deref(), Some("abc"));
    }

    #[test]
    fn test_no_token() {
        let req = request(&[("authorization", "Basic Zm9vOmJhcg==")]);
        assert!(session_token(&req, "sessionid").is_none());
    }
}

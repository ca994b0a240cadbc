//! HTTP layer for yatube-rs.
//!
//! Handlers return the render context of each page as JSON:
//!
//! - **Endpoints**: feeds, post pages, the post form, comments and follows
//! - **Extractors**: current user, login-required redirect, page number
//! - **Middleware**: session authentication and the not-found page
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod urls;

pub use endpoints::router;
pub use middleware::{AppState, app};

//! Core business logic for yatube-rs.
//!
//! Services sit between the web layer and the repositories: they build feeds
//! and detail pages, validate forms, and apply the authorization policy.

pub mod feed_cache;
pub mod forms;
pub mod pagination;
pub mod policy;
pub mod services;
pub mod views;

pub use feed_cache::FeedCache;
pub use forms::{FormErrors, Submission};
pub use pagination::{PAGE_SIZE, Page, PageNumber};
pub use policy::{Decision, FollowPolicy, PostPolicy};
pub use services::*;
pub use views::{AuthorView, CommentView, GroupView, PostView};
